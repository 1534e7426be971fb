use crate::buffer::{PacketReader, PacketWriter};
use crate::error::CodecResult;
use crate::identity::PacketIdentity;

/// A typed packet body. The reader and writer carry the negotiated version,
/// so one implementation covers every version the packet exists in.
pub trait PacketData: Sized {
    const IDENTITY: PacketIdentity;

    /// Decode the payload that follows the packet id.
    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self>;

    /// Encode the payload, without the packet id.
    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()>;
}
