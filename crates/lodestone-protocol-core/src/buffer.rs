//! Version-aware cursors over packet bytes.

use crate::codec::{self, read_length};
use crate::error::{CodecError, CodecResult};
use bytes::{BufMut, BytesMut};
use lodestone_nbt::{NbtLimits, NbtValue, RootStyle};
use lodestone_types::{BlockPos, Identifier, ProtocolVersion};
use uuid::Uuid;

pub const MAX_IDENTIFIER_LEN: usize = 32767;

/// NBT roots lost their name on the network in 1.20.2.
pub fn nbt_root_style(version: ProtocolVersion) -> RootStyle {
    if version >= ProtocolVersion::V1_20_2 {
        RootStyle::Nameless
    } else {
        RootStyle::Named
    }
}

/// A saved reader position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// A cursor over one packet's bytes. Never mutates its input.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    pos: usize,
    version: ProtocolVersion,
    nbt_limits: NbtLimits,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8], version: ProtocolVersion) -> Self {
        Self::with_limits(data, version, NbtLimits::default())
    }

    pub fn with_limits(data: &'a [u8], version: ProtocolVersion, nbt_limits: NbtLimits) -> Self {
        Self {
            data,
            pos: 0,
            version,
            nbt_limits,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0.min(self.data.len());
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    /// Run a primitive decoder over the unread bytes and advance past
    /// whatever it consumed.
    fn with_cursor<T>(&mut self, f: impl FnOnce(&mut &'a [u8]) -> CodecResult<T>) -> CodecResult<T> {
        let mut cursor = &self.data[self.pos..];
        let value = f(&mut cursor)?;
        self.pos = self.data.len() - cursor.len();
        Ok(value)
    }

    pub fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::NotEnoughData);
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> CodecResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn read_i16(&mut self) -> CodecResult<i16> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    pub fn read_u16(&mut self) -> CodecResult<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn read_i32(&mut self) -> CodecResult<i32> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    pub fn read_i64(&mut self) -> CodecResult<i64> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    pub fn read_f32(&mut self) -> CodecResult<f32> {
        Ok(f32::from_be_bytes(self.array()?))
    }

    pub fn read_f64(&mut self) -> CodecResult<f64> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    pub fn read_varint(&mut self) -> CodecResult<i32> {
        self.with_cursor(codec::read_varint)
    }

    pub fn read_varlong(&mut self) -> CodecResult<i64> {
        self.with_cursor(codec::read_varlong)
    }

    pub fn read_string(&mut self, max_len: usize) -> CodecResult<String> {
        self.with_cursor(|cursor| codec::read_string(cursor, max_len))
    }

    pub fn read_uuid(&mut self) -> CodecResult<Uuid> {
        self.with_cursor(codec::read_uuid)
    }

    pub fn read_byte_array(&mut self) -> CodecResult<Vec<u8>> {
        self.with_cursor(codec::read_byte_array)
    }

    /// A byte array with a VarInt prefix and an upper bound.
    pub fn read_byte_array_max(&mut self, max_len: usize) -> CodecResult<Vec<u8>> {
        let bytes = self.read_byte_array()?;
        if bytes.len() > max_len {
            return Err(CodecError::ValueOutOfRange {
                what: "byte array length",
                value: bytes.len() as i64,
            });
        }
        Ok(bytes)
    }

    pub fn read_fixed_bytes(&mut self, len: usize) -> CodecResult<Vec<u8>> {
        Ok(self.take(len)?.to_vec())
    }

    /// A fixed-size bitset of `bits` bits, as `ceil(bits / 8)` raw bytes.
    pub fn read_fixed_bitset(&mut self, bits: usize) -> CodecResult<Vec<u8>> {
        self.read_fixed_bytes(bits.div_ceil(8))
    }

    /// Everything that is left.
    pub fn read_rest(&mut self) -> Vec<u8> {
        let rest = self.data[self.pos..].to_vec();
        self.pos = self.data.len();
        rest
    }

    pub fn read_identifier(&mut self) -> CodecResult<Identifier> {
        let raw = self.read_string(MAX_IDENTIFIER_LEN)?;
        Ok(Identifier::parse(&raw)?)
    }

    /// Block position in the layout of the reader's version.
    pub fn read_position(&mut self) -> CodecResult<BlockPos> {
        let raw = self.read_i64()? as u64;
        Ok(if self.version >= ProtocolVersion::V1_14 {
            BlockPos::decode(raw)
        } else {
            BlockPos::decode_legacy(raw)
        })
    }

    /// A bool flag byte followed by the value when the flag is set.
    pub fn read_optional<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Option<T>> {
        if self.read_bool()? {
            f(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read a VarInt element count followed by that many elements.
    pub fn read_list<T>(
        &mut self,
        f: impl FnMut(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Vec<T>> {
        let count = self.read_list_len()?;
        self.read_elements(count, f)
    }

    /// Like [`read_list`](Self::read_list) with a cap on the element count.
    pub fn read_list_max<T>(
        &mut self,
        max: usize,
        f: impl FnMut(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Vec<T>> {
        let count = self.read_list_len()?;
        if count > max {
            return Err(CodecError::ValueOutOfRange {
                what: "list length",
                value: count as i64,
            });
        }
        self.read_elements(count, f)
    }

    /// A VarInt element count. Every element takes at least one byte, so a
    /// count above the remaining bytes can never be satisfied.
    pub fn read_list_len(&mut self) -> CodecResult<usize> {
        let count = self.with_cursor(read_length)?;
        if count > self.remaining() {
            return Err(CodecError::LengthExceedsBuffer {
                declared: count,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    /// Read exactly `count` elements.
    pub fn read_elements<T>(
        &mut self,
        count: usize,
        mut f: impl FnMut(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Vec<T>> {
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(f(self)?);
        }
        Ok(items)
    }

    /// An NBT root framed for the reader's version. `None` for `TAG_END`.
    pub fn read_nbt(&mut self) -> CodecResult<Option<NbtValue>> {
        let style = nbt_root_style(self.version);
        let limits = self.nbt_limits;
        self.with_cursor(|cursor| Ok(NbtValue::read_root(cursor, style, limits)?))
    }

    /// An NBT root that must be present.
    pub fn read_nbt_required(&mut self, field: &'static str) -> CodecResult<NbtValue> {
        self.read_nbt()?.ok_or(CodecError::MissingField(field))
    }
}

/// Accumulates one packet's bytes for a given version.
#[derive(Debug)]
pub struct PacketWriter {
    buf: BytesMut,
    version: ProtocolVersion,
}

impl PacketWriter {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            buf: BytesMut::new(),
            version,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> BytesMut {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64(value);
    }

    pub fn write_varint(&mut self, value: i32) {
        codec::write_varint(&mut self.buf, value);
    }

    pub fn write_varlong(&mut self, value: i64) {
        codec::write_varlong(&mut self.buf, value);
    }

    pub fn write_string(&mut self, value: &str, max_len: usize) -> CodecResult<()> {
        codec::write_string(&mut self.buf, value, max_len)
    }

    pub fn write_uuid(&mut self, value: &Uuid) {
        codec::write_uuid(&mut self.buf, value);
    }

    pub fn write_byte_array(&mut self, value: &[u8]) {
        codec::write_byte_array(&mut self.buf, value);
    }

    /// Raw bytes with no prefix.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.buf.put_slice(value);
    }

    /// Bytes whose length is fixed by the protocol.
    pub fn write_fixed_bytes(&mut self, value: &[u8], len: usize) -> CodecResult<()> {
        if value.len() != len {
            return Err(CodecError::ValueOutOfRange {
                what: "fixed byte array length",
                value: value.len() as i64,
            });
        }
        self.write_bytes(value);
        Ok(())
    }

    pub fn write_fixed_bitset(&mut self, value: &[u8], bits: usize) -> CodecResult<()> {
        self.write_fixed_bytes(value, bits.div_ceil(8))
    }

    pub fn write_identifier(&mut self, value: &Identifier) -> CodecResult<()> {
        self.write_string(&value.to_string(), MAX_IDENTIFIER_LEN)
    }

    pub fn write_position(&mut self, value: &BlockPos) {
        let raw = if self.version >= ProtocolVersion::V1_14 {
            value.encode()
        } else {
            value.encode_legacy()
        };
        self.write_i64(raw as i64);
    }

    pub fn write_optional<T>(
        &mut self,
        value: Option<&T>,
        f: impl FnOnce(&mut Self, &T) -> CodecResult<()>,
    ) -> CodecResult<()> {
        match value {
            Some(value) => {
                self.write_bool(true);
                f(self, value)
            }
            None => {
                self.write_bool(false);
                Ok(())
            }
        }
    }

    pub fn write_list<T>(
        &mut self,
        items: &[T],
        mut f: impl FnMut(&mut Self, &T) -> CodecResult<()>,
    ) -> CodecResult<()> {
        self.write_varint(items.len() as i32);
        for item in items {
            f(self, item)?;
        }
        Ok(())
    }

    /// An NBT root framed for the writer's version; `None` writes `TAG_END`.
    pub fn write_nbt(&mut self, value: Option<&NbtValue>) -> CodecResult<()> {
        match value {
            Some(nbt) => nbt.write_root(nbt_root_style(self.version), &mut self.buf)?,
            None => self.buf.put_u8(lodestone_nbt::TAG_END),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_nbt::nbt_compound;

    #[test]
    fn test_checkpoint_rewind() {
        let data = [0x05, 0xAC, 0x02, 0x01];
        let mut reader = PacketReader::new(&data, ProtocolVersion::V1_21);
        assert_eq!(reader.read_varint().unwrap(), 5);
        let checkpoint = reader.checkpoint();
        assert_eq!(reader.read_varint().unwrap(), 300);
        assert_eq!(reader.offset(), 3);
        reader.rewind(checkpoint);
        assert_eq!(reader.offset(), 1);
        assert_eq!(reader.read_varint().unwrap(), 300);
        assert!(reader.read_bool().unwrap());
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_truncated_primitives() {
        let data = [0x00, 0x01];
        let mut reader = PacketReader::new(&data, ProtocolVersion::V1_8);
        assert!(matches!(reader.read_i32(), Err(CodecError::NotEnoughData)));
        // A failed read does not move the cursor.
        assert_eq!(reader.offset(), 0);
        assert_eq!(reader.read_i16().unwrap(), 1);
    }

    #[test]
    fn test_invalid_bool() {
        let mut reader = PacketReader::new(&[0x02], ProtocolVersion::V1_8);
        assert!(matches!(reader.read_bool(), Err(CodecError::InvalidBool(2))));
    }

    #[test]
    fn test_list_count_bounded_by_remaining() {
        let data = [0x7F, 0x00];
        let mut reader = PacketReader::new(&data, ProtocolVersion::V1_8);
        assert!(matches!(
            reader.read_list(|r| r.read_u8()),
            Err(CodecError::LengthExceedsBuffer {
                declared: 127,
                remaining: 1
            })
        ));
    }

    #[test]
    fn test_list_and_optional() {
        let mut writer = PacketWriter::new(ProtocolVersion::V1_21);
        writer
            .write_list(&[1, 300, -1], |w, v| {
                w.write_varint(*v);
                Ok(())
            })
            .unwrap();
        writer
            .write_optional(Some(&"x".to_string()), |w, v| w.write_string(v, 16))
            .unwrap();
        writer.write_optional::<i64>(None, |w, v| {
            w.write_i64(*v);
            Ok(())
        }).unwrap();
        let bytes = writer.into_inner();

        let mut reader = PacketReader::new(&bytes, ProtocolVersion::V1_21);
        assert_eq!(reader.read_list(|r| r.read_varint()).unwrap(), vec![1, 300, -1]);
        assert_eq!(
            reader.read_optional(|r| r.read_string(16)).unwrap(),
            Some("x".to_string())
        );
        assert_eq!(reader.read_optional(|r| r.read_i64()).unwrap(), None);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_position_layout_follows_version() {
        let pos = BlockPos::new(12, -5, -900);
        for version in [ProtocolVersion::V1_8, ProtocolVersion::V1_13_2, ProtocolVersion::V1_14] {
            let mut writer = PacketWriter::new(version);
            writer.write_position(&pos);
            let bytes = writer.into_inner();
            let mut reader = PacketReader::new(&bytes, version);
            assert_eq!(reader.read_position().unwrap(), pos);
        }
    }

    #[test]
    fn test_nbt_root_style_follows_version() {
        let nbt = nbt_compound! { "a" => NbtValue::Byte(1) };
        let mut named = PacketWriter::new(ProtocolVersion::V1_20);
        named.write_nbt(Some(&nbt)).unwrap();
        let mut nameless = PacketWriter::new(ProtocolVersion::V1_20_2);
        nameless.write_nbt(Some(&nbt)).unwrap();
        // The named form carries an extra empty u16 name.
        assert_eq!(named.len(), nameless.len() + 2);

        let bytes = nameless.into_inner();
        let mut reader = PacketReader::new(&bytes, ProtocolVersion::V1_20_2);
        assert_eq!(reader.read_nbt().unwrap(), Some(nbt));

        let mut reader = PacketReader::new(&[0x00], ProtocolVersion::V1_12_2);
        assert_eq!(reader.read_nbt().unwrap(), None);
    }

    #[test]
    fn test_fixed_bytes_length_checked() {
        let mut writer = PacketWriter::new(ProtocolVersion::V1_19_3);
        assert!(writer.write_fixed_bytes(&[0; 255], 256).is_err());
        assert!(writer.write_fixed_bitset(&[0; 3], 20).is_ok());
        assert_eq!(writer.len(), 3);
    }
}
