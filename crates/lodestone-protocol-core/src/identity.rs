use crate::state::{ConnectionPhase, Direction};
use std::fmt;

macro_rules! packet_identities {
    ($($variant:ident => $phase:ident $direction:ident $name:literal;)*) => {
        /// Every logical packet kind the codec knows, independent of numeric ids.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum PacketIdentity {
            $($variant,)*
        }

        impl PacketIdentity {
            pub const ALL: &'static [PacketIdentity] = &[$(PacketIdentity::$variant,)*];

            pub const fn phase(self) -> ConnectionPhase {
                match self {
                    $(PacketIdentity::$variant => ConnectionPhase::$phase,)*
                }
            }

            pub const fn direction(self) -> Direction {
                match self {
                    $(PacketIdentity::$variant => Direction::$direction,)*
                }
            }

            /// Name within its namespace, e.g. `keep_alive`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(PacketIdentity::$variant => $name,)*
                }
            }
        }
    };
}

packet_identities! {
    Handshake => Handshake Serverbound "intention";

    StatusRequest => Status Serverbound "status_request";
    PingRequest => Status Serverbound "ping_request";
    StatusResponse => Status Clientbound "status_response";
    PongResponse => Status Clientbound "pong_response";

    LoginStart => Login Serverbound "hello";
    EncryptionResponse => Login Serverbound "key";
    LoginPluginResponse => Login Serverbound "custom_query_answer";
    LoginAcknowledged => Login Serverbound "login_acknowledged";
    LoginDisconnect => Login Clientbound "login_disconnect";
    EncryptionRequest => Login Clientbound "hello";
    LoginSuccess => Login Clientbound "game_profile";
    SetCompression => Login Clientbound "login_compression";
    LoginPluginRequest => Login Clientbound "custom_query";

    ClientInformation => Configuration Serverbound "client_information";
    ServerboundConfigPluginMessage => Configuration Serverbound "custom_payload";
    FinishConfigurationAck => Configuration Serverbound "finish_configuration";
    ServerboundConfigKeepAlive => Configuration Serverbound "keep_alive";
    ServerboundKnownPacks => Configuration Serverbound "select_known_packs";
    ClientboundConfigPluginMessage => Configuration Clientbound "custom_payload";
    ConfigDisconnect => Configuration Clientbound "disconnect";
    FinishConfiguration => Configuration Clientbound "finish_configuration";
    ClientboundConfigKeepAlive => Configuration Clientbound "keep_alive";
    RegistryData => Configuration Clientbound "registry_data";
    ClientboundKnownPacks => Configuration Clientbound "select_known_packs";

    ServerboundKeepAlive => Session Serverbound "keep_alive";
    ServerboundChatMessage => Session Serverbound "chat";
    CommandSuggestionsRequest => Session Serverbound "command_suggestion";
    SetCreativeModeSlot => Session Serverbound "set_creative_mode_slot";
    ConfigurationAcknowledged => Session Serverbound "configuration_acknowledged";
    ClientboundKeepAlive => Session Clientbound "keep_alive";
    Disconnect => Session Clientbound "disconnect";
    PlayerChatMessage => Session Clientbound "player_chat";
    SystemChat => Session Clientbound "system_chat";
    SetContainerSlot => Session Clientbound "container_set_slot";
    StartConfiguration => Session Clientbound "start_configuration";
}

impl PacketIdentity {
    /// `"<phase>.<direction>"`, e.g. `session.clientbound`.
    pub fn namespace(self) -> String {
        format!("{}.{}", self.phase(), self.direction())
    }
}

impl fmt::Display for PacketIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}", self.phase(), self.direction(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique_within_namespace() {
        let mut seen = HashSet::new();
        for identity in PacketIdentity::ALL {
            assert!(
                seen.insert((identity.namespace(), identity.name())),
                "{} declared twice",
                identity
            );
        }
    }

    #[test]
    fn test_namespace() {
        assert_eq!(
            PacketIdentity::PlayerChatMessage.namespace(),
            "session.clientbound"
        );
        assert_eq!(
            PacketIdentity::LoginStart.to_string(),
            "login.serverbound/hello"
        );
    }
}
