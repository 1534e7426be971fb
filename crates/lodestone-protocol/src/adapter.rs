use crate::packet::Packet;
use crate::packets::validate_layouts;
use bytes::BytesMut;
use lodestone_data::{registries, DataError};
use lodestone_protocol_core::frame::{build_frame, try_split_frame};
use lodestone_protocol_core::{
    packet_registry, CodecConfig, ConnectionPhase, Direction, ErrorContext, ErrorKind,
    LayoutError, PacketReader, PacketRegistry, PacketWriter, ProtocolError, RegistryError,
};
use lodestone_types::ProtocolVersion;
use thiserror::Error;
use tracing::trace;

/// The outcome of decoding one packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Packet(Packet),
    /// The id means nothing in this phase and version. The payload is kept
    /// so the packet can be forwarded verbatim.
    Unrecognized { id: i32, payload: Vec<u8> },
    /// The stream does not hold a whole frame yet.
    NeedMoreBytes,
}

/// Static tables that failed their startup checks.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("packet registry: {0}")]
    Packets(#[from] RegistryError),
    #[error("data registries: {0}")]
    Data(#[from] DataError),
    #[error("packet layout: {0}")]
    Layout(#[from] LayoutError),
}

/// Encodes and decodes packets for any supported version.
///
/// Holds no per-connection state, so one codec can be shared by every
/// connection.
#[derive(Debug, Clone)]
pub struct VersionedCodec {
    config: CodecConfig,
    packets: &'static PacketRegistry,
}

impl VersionedCodec {
    /// Build the shared tables and check them once, up front.
    pub fn new(config: CodecConfig) -> Result<Self, SetupError> {
        let packets = packet_registry()?;
        registries()?;
        validate_layouts()?;
        Ok(Self { config, packets })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode one packet (id + payload, no length prefix).
    pub fn decode_packet(
        &self,
        bytes: &[u8],
        phase: ConnectionPhase,
        direction: Direction,
        version: ProtocolVersion,
    ) -> Result<Decoded, ProtocolError> {
        let context = ErrorContext::new(phase, direction, version);
        let mut reader = PacketReader::with_limits(bytes, version, self.config.nbt_limits());

        let id = reader
            .read_varint()
            .map_err(|e| ProtocolError::codec(e, context.with_offset(reader.offset())))?;
        let context = context.with_packet_id(id);

        let Some(identity) = self.packets.resolve(phase, direction, version, id) else {
            trace!(
                "Unrecognized packet id=0x{:02X} in {} {} ({})",
                id,
                phase,
                direction,
                version
            );
            return Ok(Decoded::Unrecognized {
                id,
                payload: reader.read_rest(),
            });
        };
        let context = context.with_identity(identity);

        let packet = Packet::read(identity, &mut reader)
            .map_err(|e| ProtocolError::codec(e, context.with_offset(reader.offset())))?;
        reader
            .finish()
            .map_err(|e| ProtocolError::codec(e, context.with_offset(reader.offset())))?;

        trace!("Read packet id=0x{:02X} {} len={}", id, identity, bytes.len());
        Ok(Decoded::Packet(packet))
    }

    /// Decode the next length-prefixed frame from a stream buffer.
    ///
    /// `buf` is only advanced once a whole frame is present.
    pub fn decode_frame(
        &self,
        buf: &mut BytesMut,
        phase: ConnectionPhase,
        direction: Direction,
        version: ProtocolVersion,
    ) -> Result<Decoded, ProtocolError> {
        let frame = try_split_frame(buf, self.config.max_frame_length).map_err(|e| {
            ProtocolError::codec(e, ErrorContext::new(phase, direction, version))
        })?;
        let Some(frame) = frame else {
            return Ok(Decoded::NeedMoreBytes);
        };

        self.decode_packet(&frame, phase, direction, version)
            .map_err(|mut e| {
                // The frame is complete, so running out of bytes inside it
                // means the payload is wrong, not that more is coming.
                if e.kind == ErrorKind::TruncatedBuffer {
                    e.kind = ErrorKind::MalformedPrimitive;
                }
                e
            })
    }

    /// Encode `packet` as id + payload, without a length prefix.
    pub fn encode_packet(
        &self,
        packet: &Packet,
        phase: ConnectionPhase,
        version: ProtocolVersion,
    ) -> Result<BytesMut, ProtocolError> {
        let identity = packet.identity();
        let context = ErrorContext::new(phase, identity.direction(), version).with_identity(identity);

        if identity.phase() != phase {
            return Err(ProtocolError::new(ErrorKind::IllegalPhaseTransition, context));
        }
        let id = self
            .packets
            .id_of(identity, version)
            .ok_or_else(|| ProtocolError::new(ErrorKind::UnsupportedVersionBracket, context))?;
        let context = context.with_packet_id(id);

        let mut writer = PacketWriter::new(version);
        writer.write_varint(id);
        packet
            .write(&mut writer)
            .map_err(|e| ProtocolError::codec(e, context.with_offset(writer.len())))?;

        trace!("Wrote packet id=0x{:02X} {} len={}", id, identity, writer.len());
        Ok(writer.into_inner())
    }

    /// Encode `packet` with its VarInt length prefix.
    pub fn encode_frame(
        &self,
        packet: &Packet,
        phase: ConnectionPhase,
        version: ProtocolVersion,
    ) -> Result<BytesMut, ProtocolError> {
        let body = self.encode_packet(packet, phase, version)?;
        Ok(build_frame(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::{Handshake, ServerboundKeepAlive, StartConfiguration, StatusRequest};
    use lodestone_protocol_core::{CodecError, HandshakeIntent};
    use lodestone_types::ProtocolVersion::*;

    fn codec() -> VersionedCodec {
        VersionedCodec::new(CodecConfig::default()).unwrap()
    }

    #[test]
    fn test_decode_handshake() {
        let mut bytes = vec![0x00, 0xFF, 0x05, 9];
        bytes.extend_from_slice(b"localhost");
        bytes.extend_from_slice(&25565u16.to_be_bytes());
        bytes.push(2);

        let decoded = codec()
            .decode_packet(&bytes, ConnectionPhase::Handshake, Direction::Serverbound, V1_8)
            .unwrap();
        assert_eq!(
            decoded,
            Decoded::Packet(Packet::Handshake(Handshake {
                protocol_version: 767,
                server_address: "localhost".into(),
                server_port: 25565,
                intent: HandshakeIntent::Login,
            }))
        );
    }

    #[test]
    fn test_unknown_id_is_forwarded() {
        let decoded = codec()
            .decode_packet(&[0x7F, 1, 2, 3], ConnectionPhase::Status, Direction::Serverbound, V1_21)
            .unwrap();
        assert_eq!(
            decoded,
            Decoded::Unrecognized {
                id: 0x7F,
                payload: vec![1, 2, 3],
            }
        );
    }

    #[test]
    fn test_truncated_and_trailing_payloads() {
        let codec = codec();
        let packet = Packet::from(ServerboundKeepAlive { id: 42 });
        let bytes = codec.encode_packet(&packet, ConnectionPhase::Session, V1_21).unwrap();

        let err = codec
            .decode_packet(&bytes[..bytes.len() - 1], ConnectionPhase::Session, Direction::Serverbound, V1_21)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TruncatedBuffer);
        assert_eq!(err.context.identity, Some(packet.identity()));
        assert!(err.is_recoverable());

        let mut padded = bytes.to_vec();
        padded.push(0);
        let err = codec
            .decode_packet(&padded, ConnectionPhase::Session, Direction::Serverbound, V1_21)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedPrimitive);
        assert!(matches!(err.source, Some(CodecError::TrailingBytes(1))));
    }

    #[test]
    fn test_frame_round_trip() {
        let codec = codec();
        let packet = Packet::from(ServerboundKeepAlive { id: -5 });
        let frame = codec.encode_frame(&packet, ConnectionPhase::Session, V1_8).unwrap();

        let mut buf = BytesMut::from(&frame[..frame.len() - 1]);
        assert_eq!(
            codec
                .decode_frame(&mut buf, ConnectionPhase::Session, Direction::Serverbound, V1_8)
                .unwrap(),
            Decoded::NeedMoreBytes
        );
        assert_eq!(&buf[..], &frame[..frame.len() - 1]);

        buf.extend_from_slice(&frame[frame.len() - 1..]);
        assert_eq!(
            codec
                .decode_frame(&mut buf, ConnectionPhase::Session, Direction::Serverbound, V1_8)
                .unwrap(),
            Decoded::Packet(packet)
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_short_payload_inside_frame_is_malformed() {
        let codec = codec();
        let body = codec
            .encode_packet(&ServerboundKeepAlive { id: 1 }.into(), ConnectionPhase::Session, V1_21)
            .unwrap();
        let mut buf = build_frame(&body[..body.len() - 4]);
        let err = codec
            .decode_frame(&mut buf, ConnectionPhase::Session, Direction::Serverbound, V1_21)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedPrimitive);
    }

    #[test]
    fn test_encode_checks_phase_and_version() {
        let codec = codec();
        let err = codec
            .encode_packet(&StatusRequest.into(), ConnectionPhase::Login, V1_21)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalPhaseTransition);

        let err = codec
            .encode_packet(&StartConfiguration.into(), ConnectionPhase::Session, V1_19_4)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedVersionBracket);

        // Present fields the version cannot carry are refused, never dropped.
        let chat = crate::packets::chat::player_chat(
            V1_19_3,
            crate::chat::MessageSender::Anonymous,
            "hi",
            crate::chat::ChatTypeRef::Id(0),
        );
        let err = codec
            .encode_packet(&Packet::from(chat), ConnectionPhase::Session, V1_8)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedVersionBracket);
    }
}
