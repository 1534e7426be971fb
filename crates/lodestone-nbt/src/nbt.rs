use bytes::{Buf, BufMut};
use thiserror::Error;

/// NBT tag type IDs.
pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Vanilla's nesting cap.
pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NbtError {
    #[error("not enough data")]
    NotEnoughData,
    #[error("unknown tag type {0}")]
    UnknownTag(u8),
    #[error("NBT nested deeper than {0}")]
    TooDeep(usize),
    #[error("NBT larger than {0} bytes")]
    TooLarge(usize),
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error("declared length {declared} exceeds {remaining} remaining bytes")]
    LengthExceedsBuffer { declared: usize, remaining: usize },
    #[error("malformed modified UTF-8 string")]
    InvalidString,
    #[error("string of {0} bytes does not fit a u16 length")]
    StringTooLong(usize),
    #[error("list mixes tag {expected} and tag {found}")]
    MixedList { expected: u8, found: u8 },
}

pub type NbtResult<T> = Result<T, NbtError>;

/// Bounds applied while reading untrusted NBT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NbtLimits {
    pub max_depth: usize,
    pub max_bytes: usize,
}

impl Default for NbtLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes: 2 * 1024 * 1024,
        }
    }
}

/// How the root tag is framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStyle {
    /// Tag type, u16 name, payload (files and network before 1.20.2).
    Named,
    /// Tag type, payload (network from 1.20.2).
    Nameless,
}

/// An NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<(String, NbtValue)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn tag_id(&self) -> u8 {
        match self {
            NbtValue::Byte(_) => TAG_BYTE,
            NbtValue::Short(_) => TAG_SHORT,
            NbtValue::Int(_) => TAG_INT,
            NbtValue::Long(_) => TAG_LONG,
            NbtValue::Float(_) => TAG_FLOAT,
            NbtValue::Double(_) => TAG_DOUBLE,
            NbtValue::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtValue::String(_) => TAG_STRING,
            NbtValue::List(_) => TAG_LIST,
            NbtValue::Compound(_) => TAG_COMPOUND,
            NbtValue::IntArray(_) => TAG_INT_ARRAY,
            NbtValue::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Look up a key in a compound.
    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        match self {
            NbtValue::Compound(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NbtValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Write a root tag in the given style. Named roots get an empty name,
    /// which is what vanilla sends.
    pub fn write_root<B: BufMut>(&self, style: RootStyle, buf: &mut B) -> NbtResult<()> {
        match style {
            RootStyle::Named => self.write_root_named("", buf),
            RootStyle::Nameless => self.write_root_network(buf),
        }
    }

    /// Write this value as a root tag with no name (network format, 1.20.2+).
    pub fn write_root_network<B: BufMut>(&self, buf: &mut B) -> NbtResult<()> {
        buf.put_u8(self.tag_id());
        self.write_payload(buf)
    }

    /// Write this value as a full named root tag.
    pub fn write_root_named<B: BufMut>(&self, name: &str, buf: &mut B) -> NbtResult<()> {
        buf.put_u8(self.tag_id());
        write_nbt_string(name, buf)?;
        self.write_payload(buf)
    }

    /// Write just the payload (no tag type or name).
    pub fn write_payload<B: BufMut>(&self, buf: &mut B) -> NbtResult<()> {
        match self {
            NbtValue::Byte(v) => buf.put_i8(*v),
            NbtValue::Short(v) => buf.put_i16(*v),
            NbtValue::Int(v) => buf.put_i32(*v),
            NbtValue::Long(v) => buf.put_i64(*v),
            NbtValue::Float(v) => buf.put_f32(*v),
            NbtValue::Double(v) => buf.put_f64(*v),
            NbtValue::ByteArray(v) => {
                buf.put_i32(v.len() as i32);
                for b in v {
                    buf.put_i8(*b);
                }
            }
            NbtValue::String(v) => write_nbt_string(v, buf)?,
            NbtValue::List(v) => {
                let element = v.first().map_or(TAG_END, NbtValue::tag_id);
                buf.put_u8(element);
                buf.put_i32(v.len() as i32);
                for item in v {
                    if item.tag_id() != element {
                        return Err(NbtError::MixedList {
                            expected: element,
                            found: item.tag_id(),
                        });
                    }
                    item.write_payload(buf)?;
                }
            }
            NbtValue::Compound(entries) => {
                for (name, value) in entries {
                    buf.put_u8(value.tag_id());
                    write_nbt_string(name, buf)?;
                    value.write_payload(buf)?;
                }
                buf.put_u8(TAG_END);
            }
            NbtValue::IntArray(v) => {
                buf.put_i32(v.len() as i32);
                for i in v {
                    buf.put_i32(*i);
                }
            }
            NbtValue::LongArray(v) => {
                buf.put_i32(v.len() as i32);
                for l in v {
                    buf.put_i64(*l);
                }
            }
        }
        Ok(())
    }

    /// Read a root tag. A leading `TAG_END` means "no value" and yields `None`.
    /// The name of a named root is discarded.
    pub fn read_root<B: Buf>(
        buf: &mut B,
        style: RootStyle,
        limits: NbtLimits,
    ) -> NbtResult<Option<NbtValue>> {
        let mut reader = NbtReader {
            buf,
            limits,
            consumed: 0,
        };
        let tag = reader.u8()?;
        if tag == TAG_END {
            return Ok(None);
        }
        if style == RootStyle::Named {
            reader.string()?;
        }
        reader.payload(tag, 0).map(Some)
    }
}

struct NbtReader<'a, B: Buf> {
    buf: &'a mut B,
    limits: NbtLimits,
    consumed: usize,
}

impl<B: Buf> NbtReader<'_, B> {
    fn take(&mut self, n: usize) -> NbtResult<()> {
        if self.buf.remaining() < n {
            return Err(NbtError::NotEnoughData);
        }
        self.consumed += n;
        if self.consumed > self.limits.max_bytes {
            return Err(NbtError::TooLarge(self.limits.max_bytes));
        }
        Ok(())
    }

    fn u8(&mut self) -> NbtResult<u8> {
        self.take(1)?;
        Ok(self.buf.get_u8())
    }

    fn length(&mut self, element_size: usize) -> NbtResult<usize> {
        self.take(4)?;
        let len = self.buf.get_i32();
        if len < 0 {
            return Err(NbtError::NegativeLength(len));
        }
        let len = len as usize;
        let needed = len.saturating_mul(element_size);
        if needed > self.buf.remaining() {
            return Err(NbtError::LengthExceedsBuffer {
                declared: len,
                remaining: self.buf.remaining(),
            });
        }
        Ok(len)
    }

    fn string(&mut self) -> NbtResult<String> {
        self.take(2)?;
        let len = self.buf.get_u16() as usize;
        self.take(len)?;
        let mut bytes = vec![0u8; len];
        self.buf.copy_to_slice(&mut bytes);
        decode_modified_utf8(&bytes)
    }

    fn payload(&mut self, tag: u8, depth: usize) -> NbtResult<NbtValue> {
        if depth > self.limits.max_depth {
            return Err(NbtError::TooDeep(self.limits.max_depth));
        }
        let value = match tag {
            TAG_BYTE => {
                self.take(1)?;
                NbtValue::Byte(self.buf.get_i8())
            }
            TAG_SHORT => {
                self.take(2)?;
                NbtValue::Short(self.buf.get_i16())
            }
            TAG_INT => {
                self.take(4)?;
                NbtValue::Int(self.buf.get_i32())
            }
            TAG_LONG => {
                self.take(8)?;
                NbtValue::Long(self.buf.get_i64())
            }
            TAG_FLOAT => {
                self.take(4)?;
                NbtValue::Float(self.buf.get_f32())
            }
            TAG_DOUBLE => {
                self.take(8)?;
                NbtValue::Double(self.buf.get_f64())
            }
            TAG_BYTE_ARRAY => {
                let len = self.length(1)?;
                self.take(len)?;
                NbtValue::ByteArray((0..len).map(|_| self.buf.get_i8()).collect())
            }
            TAG_STRING => NbtValue::String(self.string()?),
            TAG_LIST => {
                let element = self.u8()?;
                // Every element takes at least one byte except TAG_END.
                let len = self.length(if element == TAG_END { 0 } else { 1 })?;
                if element == TAG_END && len > 0 {
                    return Err(NbtError::UnknownTag(TAG_END));
                }
                let mut items = Vec::with_capacity(len.min(self.buf.remaining()));
                for _ in 0..len {
                    items.push(self.payload(element, depth + 1)?);
                }
                NbtValue::List(items)
            }
            TAG_COMPOUND => {
                let mut entries = Vec::new();
                loop {
                    let child = self.u8()?;
                    if child == TAG_END {
                        break;
                    }
                    let name = self.string()?;
                    let value = self.payload(child, depth + 1)?;
                    entries.push((name, value));
                }
                NbtValue::Compound(entries)
            }
            TAG_INT_ARRAY => {
                let len = self.length(4)?;
                self.take(len * 4)?;
                NbtValue::IntArray((0..len).map(|_| self.buf.get_i32()).collect())
            }
            TAG_LONG_ARRAY => {
                let len = self.length(8)?;
                self.take(len * 8)?;
                NbtValue::LongArray((0..len).map(|_| self.buf.get_i64()).collect())
            }
            other => return Err(NbtError::UnknownTag(other)),
        };
        Ok(value)
    }
}

fn write_nbt_string<B: BufMut>(s: &str, buf: &mut B) -> NbtResult<()> {
    let bytes = encode_modified_utf8(s);
    if bytes.len() > u16::MAX as usize {
        return Err(NbtError::StringTooLong(bytes.len()));
    }
    buf.put_u16(bytes.len() as u16);
    buf.put_slice(&bytes);
    Ok(())
}

/// Java's modified UTF-8: NUL is two bytes and supplementary characters are
/// written as two three-byte surrogates.
fn encode_modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

fn decode_modified_utf8(bytes: &[u8]) -> NbtResult<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let continuation = |idx: usize| -> NbtResult<u16> {
            match bytes.get(idx) {
                Some(c) if c & 0xC0 == 0x80 => Ok((c & 0x3F) as u16),
                _ => Err(NbtError::InvalidString),
            }
        };
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            units.push((((b & 0x1F) as u16) << 6) | continuation(i + 1)?);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            units.push(
                (((b & 0x0F) as u16) << 12) | (continuation(i + 1)? << 6) | continuation(i + 2)?,
            );
            i += 3;
        } else {
            return Err(NbtError::InvalidString);
        }
    }
    String::from_utf16(&units).map_err(|_| NbtError::InvalidString)
}

/// Helper macro for building compound tags.
#[macro_export]
macro_rules! nbt_compound {
    ($($key:expr => $val:expr),* $(,)?) => {
        $crate::NbtValue::Compound(vec![
            $(($key.into(), $val)),*
        ])
    };
}

/// Helper macro for building list tags.
#[macro_export]
macro_rules! nbt_list {
    ($($val:expr),* $(,)?) => {
        $crate::NbtValue::List(vec![$($val),*])
    };
}
