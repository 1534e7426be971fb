//! VarInt length-prefixed framing (no compression, no encryption).

use crate::codec::{read_varint, varint_len, write_varint};
use crate::error::{CodecError, CodecResult};
use bytes::{Buf, BytesMut};
use tracing::trace;

/// Split one complete frame off the front of `read_buf`.
///
/// Returns `Ok(None)` and leaves `read_buf` untouched until the length prefix
/// and the whole body have arrived.
pub fn try_split_frame(read_buf: &mut BytesMut, max_len: usize) -> CodecResult<Option<BytesMut>> {
    if read_buf.is_empty() {
        return Ok(None);
    }

    let mut peek = &read_buf[..];
    let length = match read_varint(&mut peek) {
        Ok(len) => len,
        Err(CodecError::NotEnoughData) => return Ok(None),
        Err(e) => return Err(e),
    };
    if length < 0 {
        return Err(CodecError::NegativeLength(length));
    }
    let length = length as usize;
    if length > max_len {
        return Err(CodecError::ValueOutOfRange {
            what: "frame length",
            value: length as i64,
        });
    }

    let varint_bytes = read_buf.len() - peek.len();

    if peek.remaining() < length {
        return Ok(None);
    }

    read_buf.advance(varint_bytes);
    let frame = read_buf.split_to(length);
    trace!("Read frame len={}", length);
    Ok(Some(frame))
}

/// Prefix `packet` (id + payload) with its length.
pub fn build_frame(packet: &[u8]) -> BytesMut {
    let mut frame = BytesMut::with_capacity(varint_len(packet.len() as i32) + packet.len());
    write_varint(&mut frame, packet.len() as i32);
    frame.extend_from_slice(packet);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_frame_untouched() {
        let frame = build_frame(&[0x00, 0x01, 0x02, 0x03]);
        for cut in 0..frame.len() {
            let mut buf = BytesMut::from(&frame[..cut]);
            assert!(try_split_frame(&mut buf, 1024).unwrap().is_none());
            assert_eq!(&buf[..], &frame[..cut]);
        }
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut buf = build_frame(&[0x01, 0xAA]);
        buf.extend_from_slice(&build_frame(&[0x02]));
        buf.extend_from_slice(&[0x05]);
        assert_eq!(&try_split_frame(&mut buf, 1024).unwrap().unwrap()[..], &[0x01, 0xAA]);
        assert_eq!(&try_split_frame(&mut buf, 1024).unwrap().unwrap()[..], &[0x02]);
        assert!(try_split_frame(&mut buf, 1024).unwrap().is_none());
        assert_eq!(&buf[..], &[0x05]);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut buf = BytesMut::from(&[0x80, 0x80, 0x01][..]);
        assert!(matches!(
            try_split_frame(&mut buf, 1024),
            Err(CodecError::ValueOutOfRange { .. })
        ));
        let mut buf = BytesMut::from(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01][..]);
        assert!(matches!(
            try_split_frame(&mut buf, 1024),
            Err(CodecError::VarIntTooLong)
        ));
    }
}
