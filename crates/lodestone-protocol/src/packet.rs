use crate::packets::*;
use lodestone_protocol_core::{
    CodecError, CodecResult, PacketData, PacketIdentity, PacketReader, PacketWriter,
};

macro_rules! packets {
    ($($ty:ident),* $(,)?) => {
        /// Every packet the codec understands, across all phases.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Packet {
            $($ty($ty),)*
        }

        impl Packet {
            pub fn identity(&self) -> PacketIdentity {
                match self {
                    $(Packet::$ty(_) => <$ty as PacketData>::IDENTITY,)*
                }
            }

            /// Decode the payload of the packet kind `identity`.
            pub fn read(identity: PacketIdentity, reader: &mut PacketReader<'_>) -> CodecResult<Self> {
                $(
                    if identity == <$ty as PacketData>::IDENTITY {
                        return Ok(Packet::$ty(<$ty as PacketData>::read(reader)?));
                    }
                )*
                Err(CodecError::InvalidEnum {
                    what: "packet identity",
                    value: identity as i32,
                })
            }

            /// Encode the payload, without the packet id.
            pub fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
                match self {
                    $(Packet::$ty(packet) => packet.write(writer),)*
                }
            }
        }

        $(
            impl From<$ty> for Packet {
                fn from(packet: $ty) -> Self {
                    Packet::$ty(packet)
                }
            }
        )*
    };
}

packets! {
    Handshake,
    StatusRequest,
    PingRequest,
    StatusResponse,
    PongResponse,
    LoginStart,
    EncryptionResponse,
    LoginPluginResponse,
    LoginAcknowledged,
    LoginDisconnect,
    EncryptionRequest,
    LoginSuccess,
    SetCompression,
    LoginPluginRequest,
    ClientInformation,
    ServerboundConfigPluginMessage,
    FinishConfigurationAck,
    ServerboundConfigKeepAlive,
    ServerboundKnownPacks,
    ClientboundConfigPluginMessage,
    ConfigDisconnect,
    FinishConfiguration,
    ClientboundConfigKeepAlive,
    RegistryData,
    ClientboundKnownPacks,
    ServerboundKeepAlive,
    ServerboundChatMessage,
    CommandSuggestionsRequest,
    SetCreativeModeSlot,
    ConfigurationAcknowledged,
    ClientboundKeepAlive,
    Disconnect,
    PlayerChatMessage,
    SystemChat,
    SetContainerSlot,
    StartConfiguration,
}
