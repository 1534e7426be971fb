pub use chat::{PlayerChatMessage, ServerboundChatMessage, SystemChat};
pub use configuration::*;
pub use handshake::Handshake;
pub use login::*;
pub use session::*;
pub use status::*;

use lodestone_protocol_core::LayoutError;

/// Bind a packet struct to its identity and layout.
macro_rules! layout_packet {
    ($ty:ident, $layout:ident) => {
        impl lodestone_protocol_core::PacketData for $ty {
            const IDENTITY: lodestone_protocol_core::PacketIdentity =
                lodestone_protocol_core::PacketIdentity::$ty;

            fn read(
                reader: &mut lodestone_protocol_core::PacketReader<'_>,
            ) -> lodestone_protocol_core::CodecResult<Self> {
                $layout.read(reader)
            }

            fn write(
                &self,
                writer: &mut lodestone_protocol_core::PacketWriter,
            ) -> lodestone_protocol_core::CodecResult<()> {
                $layout.write(writer, self)
            }
        }
    };
}

/// Packets with no payload.
macro_rules! empty_packets {
    ($($ty:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $ty;

            impl lodestone_protocol_core::PacketData for $ty {
                const IDENTITY: lodestone_protocol_core::PacketIdentity =
                    lodestone_protocol_core::PacketIdentity::$ty;

                fn read(
                    _reader: &mut lodestone_protocol_core::PacketReader<'_>,
                ) -> lodestone_protocol_core::CodecResult<Self> {
                    Ok($ty)
                }

                fn write(
                    &self,
                    _writer: &mut lodestone_protocol_core::PacketWriter,
                ) -> lodestone_protocol_core::CodecResult<()> {
                    Ok(())
                }
            }
        )*
    };
}

pub mod chat;
pub mod configuration;
pub mod handshake;
pub mod login;
pub mod session;
pub mod status;

/// Check every version-branching layout.
pub fn validate_layouts() -> Result<(), LayoutError> {
    login::LOGIN_START.validate()?;
    login::ENCRYPTION_RESPONSE.validate()?;
    login::ENCRYPTION_REQUEST.validate()?;
    login::LOGIN_SUCCESS.validate()?;
    configuration::CLIENT_INFORMATION.validate()?;
    configuration::REGISTRY_DATA.validate()?;
    session::SERVERBOUND_KEEP_ALIVE.validate()?;
    session::CLIENTBOUND_KEEP_ALIVE.validate()?;
    session::COMMAND_SUGGESTIONS_REQUEST.validate()?;
    session::SET_CONTAINER_SLOT.validate()?;
    chat::SERVERBOUND_CHAT_MESSAGE.validate()?;
    chat::PLAYER_CHAT_MESSAGE.validate()?;
    chat::SYSTEM_CHAT.validate()?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_layout_validates() {
        validate_layouts().unwrap();
    }
}
