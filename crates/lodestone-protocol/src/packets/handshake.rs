use lodestone_protocol_core::{
    CodecError, CodecResult, HandshakeIntent, PacketData, PacketIdentity, PacketReader,
    PacketWriter,
};
use lodestone_types::ProtocolVersion;

pub const MAX_ADDRESS_LEN: usize = 255;

/// The first packet of every connection. Its layout never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Raw protocol number, which may name a version we do not support.
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub intent: HandshakeIntent,
}

impl Handshake {
    /// The version that decides which intents are legal. Unknown numbers
    /// above the newest release get the newest rules.
    fn intent_version(&self) -> ProtocolVersion {
        ProtocolVersion::from_protocol(self.protocol_version).unwrap_or(
            if self.protocol_version > ProtocolVersion::NEWEST.protocol() {
                ProtocolVersion::NEWEST
            } else {
                ProtocolVersion::OLDEST
            },
        )
    }
}

impl PacketData for Handshake {
    const IDENTITY: PacketIdentity = PacketIdentity::Handshake;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        let mut handshake = Handshake {
            protocol_version: reader.read_varint()?,
            server_address: reader.read_string(MAX_ADDRESS_LEN)?,
            server_port: reader.read_u16()?,
            intent: HandshakeIntent::Status,
        };
        let raw = reader.read_varint()?;
        handshake.intent = HandshakeIntent::from_wire(raw, handshake.intent_version()).ok_or(
            CodecError::InvalidEnum {
                what: "handshake intent",
                value: raw,
            },
        )?;
        Ok(handshake)
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        let version = self.intent_version();
        if HandshakeIntent::from_wire(self.intent.to_wire(), version).is_none() {
            return Err(CodecError::FieldNotInVersion {
                field: "transfer intent",
                version,
            });
        }
        writer.write_varint(self.protocol_version);
        writer.write_string(&self.server_address, MAX_ADDRESS_LEN)?;
        writer.write_u16(self.server_port);
        writer.write_varint(self.intent.to_wire());
        Ok(())
    }
}
