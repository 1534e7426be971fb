//! Wire primitives shared by the packet reader, writer, and framing.

use crate::error::{CodecError, CodecResult};
use bytes::{Buf, BufMut};
use uuid::Uuid;

pub const MAX_VARINT_LEN: usize = 5;
pub const MAX_VARLONG_LEN: usize = 10;

/// Read a VarInt from the buffer.
pub fn read_varint<B: Buf>(buf: &mut B) -> CodecResult<i32> {
    let mut result: i32 = 0;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(CodecError::VarIntTooLong)
}

/// Write a VarInt to the buffer.
pub fn write_varint<B: BufMut>(buf: &mut B, mut value: i32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u32) >> 7) as i32;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Calculate the byte length of a VarInt.
pub fn varint_len(value: i32) -> usize {
    let mut val = value as u32;
    let mut len = 0;
    loop {
        len += 1;
        val >>= 7;
        if val == 0 {
            break;
        }
    }
    len
}

/// Read a VarLong from the buffer.
pub fn read_varlong<B: Buf>(buf: &mut B) -> CodecResult<i64> {
    let mut result: i64 = 0;
    for i in 0..MAX_VARLONG_LEN {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(CodecError::VarIntTooLong)
}

/// Write a VarLong to the buffer.
pub fn write_varlong<B: BufMut>(buf: &mut B, mut value: i64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u64) >> 7) as i64;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Check a string against a limit counted in UTF-16 units, like the client does.
pub fn check_string_len(s: &str, max_len: usize) -> CodecResult<()> {
    // Cheap early out: every UTF-16 unit is at least one byte.
    if s.len() <= max_len {
        return Ok(());
    }
    let units = s.encode_utf16().count();
    if units > max_len {
        return Err(CodecError::StringTooLong {
            len: units,
            max: max_len,
        });
    }
    Ok(())
}

/// Read a protocol string (varint-prefixed UTF-8).
pub fn read_string<B: Buf>(buf: &mut B, max_len: usize) -> CodecResult<String> {
    let len = read_length(buf)?;
    if len > max_len * 3 {
        return Err(CodecError::StringTooLong {
            len,
            max: max_len * 3,
        });
    }
    if buf.remaining() < len {
        return Err(CodecError::NotEnoughData);
    }
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    let s = String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
    check_string_len(&s, max_len)?;
    Ok(s)
}

/// Write a protocol string.
pub fn write_string<B: BufMut>(buf: &mut B, s: &str, max_len: usize) -> CodecResult<()> {
    check_string_len(s, max_len)?;
    write_varint(buf, s.len() as i32);
    buf.put_slice(s.as_bytes());
    Ok(())
}

/// Read a UUID (128 bits, big endian).
pub fn read_uuid<B: Buf>(buf: &mut B) -> CodecResult<Uuid> {
    if buf.remaining() < 16 {
        return Err(CodecError::NotEnoughData);
    }
    let mut bytes = [0u8; 16];
    buf.copy_to_slice(&mut bytes);
    Ok(Uuid::from_bytes(bytes))
}

/// Write a UUID.
pub fn write_uuid<B: BufMut>(buf: &mut B, uuid: &Uuid) {
    buf.put_slice(uuid.as_bytes());
}

/// Read a byte array with varint length prefix.
pub fn read_byte_array<B: Buf>(buf: &mut B) -> CodecResult<Vec<u8>> {
    let len = read_length(buf)?;
    if buf.remaining() < len {
        return Err(CodecError::LengthExceedsBuffer {
            declared: len,
            remaining: buf.remaining(),
        });
    }
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    Ok(bytes)
}

/// Write a byte array with varint length prefix.
pub fn write_byte_array<B: BufMut>(buf: &mut B, data: &[u8]) {
    write_varint(buf, data.len() as i32);
    buf.put_slice(data);
}

/// Read a non-negative VarInt length.
pub fn read_length<B: Buf>(buf: &mut B) -> CodecResult<usize> {
    let len = read_varint(buf)?;
    if len < 0 {
        return Err(CodecError::NegativeLength(len));
    }
    Ok(len as usize)
}
