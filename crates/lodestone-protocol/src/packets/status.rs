use lodestone_protocol_core::{
    CodecResult, PacketData, PacketIdentity, PacketReader, PacketWriter,
};

pub const MAX_STATUS_LEN: usize = 32767;

empty_packets!(StatusRequest);

/// The server list response, as raw JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusResponse {
    pub json: String,
}

impl PacketData for StatusResponse {
    const IDENTITY: PacketIdentity = PacketIdentity::StatusResponse;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            json: reader.read_string(MAX_STATUS_LEN)?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_string(&self.json, MAX_STATUS_LEN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingRequest {
    pub payload: i64,
}

impl PacketData for PingRequest {
    const IDENTITY: PacketIdentity = PacketIdentity::PingRequest;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            payload: reader.read_i64()?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_i64(self.payload);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PongResponse {
    pub payload: i64,
}

impl PacketData for PongResponse {
    const IDENTITY: PacketIdentity = PacketIdentity::PongResponse;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            payload: reader.read_i64()?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_i64(self.payload);
        Ok(())
    }
}
