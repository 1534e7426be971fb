//! Numeric packet ids per (phase, direction, version).

use crate::identity::PacketIdentity;
use crate::state::{ConnectionPhase, Direction};
use lodestone_types::{BracketError, BracketIndex, ProtocolVersion, VersionBrackets};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use thiserror::Error;

use PacketIdentity::*;
use ProtocolVersion::*;

type IdBrackets = &'static [(ProtocolVersion, Option<i32>)];

/// Wire ids, by the version each id took effect in. `None` retires a packet.
static PACKET_IDS: &[(PacketIdentity, IdBrackets)] = &[
    (Handshake, &[(V1_8, Some(0x00))]),
    // Status
    (StatusRequest, &[(V1_8, Some(0x00))]),
    (PingRequest, &[(V1_8, Some(0x01))]),
    (StatusResponse, &[(V1_8, Some(0x00))]),
    (PongResponse, &[(V1_8, Some(0x01))]),
    // Login
    (LoginStart, &[(V1_8, Some(0x00))]),
    (EncryptionResponse, &[(V1_8, Some(0x01))]),
    (LoginPluginResponse, &[(V1_13, Some(0x02))]),
    (LoginAcknowledged, &[(V1_20_2, Some(0x03))]),
    (LoginDisconnect, &[(V1_8, Some(0x00))]),
    (EncryptionRequest, &[(V1_8, Some(0x01))]),
    (LoginSuccess, &[(V1_8, Some(0x02))]),
    (SetCompression, &[(V1_8, Some(0x03))]),
    (LoginPluginRequest, &[(V1_13, Some(0x04))]),
    // Configuration
    (ClientInformation, &[(V1_20_2, Some(0x00))]),
    (ServerboundConfigPluginMessage, &[(V1_20_2, Some(0x01)), (V1_20_5, Some(0x02))]),
    (FinishConfigurationAck, &[(V1_20_2, Some(0x02)), (V1_20_5, Some(0x03))]),
    (ServerboundConfigKeepAlive, &[(V1_20_2, Some(0x03)), (V1_20_5, Some(0x04))]),
    (ServerboundKnownPacks, &[(V1_20_5, Some(0x07))]),
    (ClientboundConfigPluginMessage, &[(V1_20_2, Some(0x00)), (V1_20_5, Some(0x01))]),
    (ConfigDisconnect, &[(V1_20_2, Some(0x01)), (V1_20_5, Some(0x02))]),
    (FinishConfiguration, &[(V1_20_2, Some(0x02)), (V1_20_5, Some(0x03))]),
    (ClientboundConfigKeepAlive, &[(V1_20_2, Some(0x03)), (V1_20_5, Some(0x04))]),
    (RegistryData, &[(V1_20_2, Some(0x05)), (V1_20_5, Some(0x07))]),
    (ClientboundKnownPacks, &[(V1_20_5, Some(0x0E))]),
    // Session, serverbound
    (
        ServerboundKeepAlive,
        &[
            (V1_8, Some(0x00)),
            (V1_9, Some(0x0B)),
            (V1_12, Some(0x0C)),
            (V1_12_1, Some(0x0B)),
            (V1_13, Some(0x0E)),
            (V1_14, Some(0x0F)),
            (V1_16, Some(0x10)),
            (V1_17, Some(0x0F)),
            (V1_19, Some(0x11)),
            (V1_19_1, Some(0x12)),
            (V1_19_3, Some(0x11)),
            (V1_19_4, Some(0x12)),
            (V1_20_2, Some(0x14)),
            (V1_20_3, Some(0x15)),
            (V1_20_5, Some(0x18)),
            (V1_21_2, Some(0x1A)),
        ],
    ),
    (
        ServerboundChatMessage,
        &[
            (V1_8, Some(0x01)),
            (V1_9, Some(0x02)),
            (V1_12, Some(0x03)),
            (V1_12_1, Some(0x02)),
            (V1_13, Some(0x03)),
            (V1_19, Some(0x04)),
            (V1_19_1, Some(0x05)),
            (V1_20_5, Some(0x06)),
            (V1_21_2, Some(0x07)),
        ],
    ),
    (
        CommandSuggestionsRequest,
        &[
            (V1_8, Some(0x14)),
            (V1_9, Some(0x01)),
            (V1_12, Some(0x02)),
            (V1_12_1, Some(0x01)),
            (V1_13, Some(0x05)),
            (V1_14, Some(0x06)),
            (V1_19, Some(0x08)),
            (V1_19_1, Some(0x09)),
            (V1_19_3, Some(0x08)),
            (V1_19_4, Some(0x09)),
            (V1_20_2, Some(0x0A)),
            (V1_20_5, Some(0x0B)),
            (V1_21_2, Some(0x0D)),
        ],
    ),
    (
        SetCreativeModeSlot,
        &[
            (V1_8, Some(0x10)),
            (V1_9, Some(0x18)),
            (V1_12, Some(0x1B)),
            (V1_13, Some(0x24)),
            (V1_14, Some(0x26)),
            (V1_16, Some(0x27)),
            (V1_16_2, Some(0x28)),
            (V1_19, Some(0x2A)),
            (V1_19_1, Some(0x2B)),
            (V1_19_3, Some(0x2A)),
            (V1_19_4, Some(0x2B)),
            (V1_20_2, Some(0x2E)),
            (V1_20_3, Some(0x2F)),
            (V1_20_5, Some(0x32)),
            (V1_21_2, Some(0x36)),
        ],
    ),
    (
        ConfigurationAcknowledged,
        &[
            (V1_20_2, Some(0x0B)),
            (V1_20_5, Some(0x0C)),
            (V1_21_2, Some(0x0E)),
        ],
    ),
    // Session, clientbound
    (
        ClientboundKeepAlive,
        &[
            (V1_8, Some(0x00)),
            (V1_9, Some(0x1F)),
            (V1_13, Some(0x21)),
            (V1_14, Some(0x20)),
            (V1_15, Some(0x21)),
            (V1_16, Some(0x20)),
            (V1_16_2, Some(0x1F)),
            (V1_17, Some(0x21)),
            (V1_19, Some(0x1E)),
            (V1_19_1, Some(0x20)),
            (V1_19_3, Some(0x1F)),
            (V1_19_4, Some(0x23)),
            (V1_20_2, Some(0x24)),
            (V1_20_5, Some(0x26)),
            (V1_21_2, Some(0x27)),
        ],
    ),
    (
        Disconnect,
        &[
            (V1_8, Some(0x40)),
            (V1_9, Some(0x1A)),
            (V1_13, Some(0x1B)),
            (V1_14, Some(0x1A)),
            (V1_15, Some(0x1B)),
            (V1_16, Some(0x1A)),
            (V1_16_2, Some(0x19)),
            (V1_17, Some(0x1A)),
            (V1_19, Some(0x17)),
            (V1_19_1, Some(0x19)),
            (V1_19_3, Some(0x17)),
            (V1_19_4, Some(0x1A)),
            (V1_20_2, Some(0x1B)),
            (V1_20_5, Some(0x1D)),
        ],
    ),
    (
        PlayerChatMessage,
        &[
            (V1_8, Some(0x02)),
            (V1_9, Some(0x0F)),
            (V1_13, Some(0x0E)),
            (V1_15, Some(0x0F)),
            (V1_16, Some(0x0E)),
            (V1_17, Some(0x0F)),
            (V1_19, Some(0x30)),
            (V1_19_1, Some(0x33)),
            (V1_19_3, Some(0x31)),
            (V1_19_4, Some(0x35)),
            (V1_20_2, Some(0x37)),
            (V1_20_5, Some(0x39)),
            (V1_21_2, Some(0x3B)),
        ],
    ),
    (
        SystemChat,
        &[
            (V1_19, Some(0x5F)),
            (V1_19_1, Some(0x62)),
            (V1_19_3, Some(0x60)),
            (V1_19_4, Some(0x64)),
            (V1_20_2, Some(0x67)),
            (V1_20_3, Some(0x69)),
            (V1_20_5, Some(0x6C)),
            (V1_21_2, Some(0x73)),
        ],
    ),
    (
        SetContainerSlot,
        &[
            (V1_8, Some(0x2F)),
            (V1_9, Some(0x16)),
            (V1_13, Some(0x17)),
            (V1_14, Some(0x16)),
            (V1_15, Some(0x17)),
            (V1_16, Some(0x16)),
            (V1_16_2, Some(0x15)),
            (V1_17, Some(0x16)),
            (V1_19, Some(0x13)),
            (V1_19_3, Some(0x12)),
            (V1_19_4, Some(0x14)),
            (V1_20_2, Some(0x15)),
            (V1_21_2, Some(0x14)),
        ],
    ),
    (
        StartConfiguration,
        &[
            (V1_20_2, Some(0x65)),
            (V1_20_3, Some(0x67)),
            (V1_20_5, Some(0x69)),
            (V1_21_2, Some(0x70)),
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{0} has no packet id table")]
    MissingIds(PacketIdentity),
    #[error("{identity}: {source}")]
    Bracket {
        identity: PacketIdentity,
        source: BracketError,
    },
    #[error("id 0x{id:02X} in {phase}.{direction} at {version} claimed by both {existing} and {incoming}")]
    DuplicateId {
        phase: ConnectionPhase,
        direction: Direction,
        version: ProtocolVersion,
        id: i32,
        existing: PacketIdentity,
        incoming: PacketIdentity,
    },
}

/// Maps packet identities to numeric ids and back, per version.
#[derive(Debug)]
pub struct PacketRegistry {
    ids: HashMap<PacketIdentity, VersionBrackets<i32>>,
    reverse: HashMap<(ConnectionPhase, Direction), BracketIndex<i32, PacketIdentity>>,
}

impl PacketRegistry {
    pub fn build() -> Result<Self, RegistryError> {
        let mut ids = HashMap::with_capacity(PacketIdentity::ALL.len());
        for &identity in PacketIdentity::ALL {
            let (_, table) = PACKET_IDS
                .iter()
                .find(|(candidate, _)| *candidate == identity)
                .ok_or(RegistryError::MissingIds(identity))?;
            let brackets = VersionBrackets::new(table.to_vec())
                .map_err(|source| RegistryError::Bracket { identity, source })?;
            ids.insert(identity, brackets);
        }

        let mut reverse = HashMap::new();
        for phase in ConnectionPhase::ALL {
            for direction in [Direction::Serverbound, Direction::Clientbound] {
                let members = PacketIdentity::ALL
                    .iter()
                    .filter(|identity| identity.phase() == phase && identity.direction() == direction)
                    .map(|identity| (&ids[identity], *identity));
                let index = BracketIndex::build(members).map_err(|collision| {
                    RegistryError::DuplicateId {
                        phase,
                        direction,
                        version: collision.version,
                        id: collision.key,
                        existing: collision.existing,
                        incoming: collision.incoming,
                    }
                })?;
                reverse.insert((phase, direction), index);
            }
        }

        tracing::debug!("Built packet registry with {} identities", ids.len());
        Ok(Self { ids, reverse })
    }

    /// The identity behind a wire id, or `None` if the version has no such packet.
    pub fn resolve(
        &self,
        phase: ConnectionPhase,
        direction: Direction,
        version: ProtocolVersion,
        id: i32,
    ) -> Option<PacketIdentity> {
        self.reverse.get(&(phase, direction))?.get(version, id)
    }

    /// The wire id of `identity` in `version`.
    pub fn id_of(&self, identity: PacketIdentity, version: ProtocolVersion) -> Option<i32> {
        if !identity.phase().exists_in(version) {
            return None;
        }
        self.ids.get(&identity)?.get(version).copied()
    }
}

static PACKET_REGISTRY: OnceCell<PacketRegistry> = OnceCell::new();

/// The process-wide packet registry, built on first use.
pub fn packet_registry() -> Result<&'static PacketRegistry, RegistryError> {
    PACKET_REGISTRY.get_or_try_init(PacketRegistry::build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_without_duplicates() {
        packet_registry().unwrap();
    }

    #[test]
    fn test_every_id_resolves_back() {
        let registry = packet_registry().unwrap();
        for &version in ProtocolVersion::ALL {
            for &identity in PacketIdentity::ALL {
                let Some(id) = registry.id_of(identity, version) else {
                    continue;
                };
                assert_eq!(
                    registry.resolve(identity.phase(), identity.direction(), version, id),
                    Some(identity),
                    "{} in {}",
                    identity,
                    version
                );
            }
        }
    }

    #[test]
    fn test_chat_ids_move_between_versions() {
        let registry = packet_registry().unwrap();
        assert_eq!(registry.id_of(PlayerChatMessage, V1_8), Some(0x02));
        assert_eq!(registry.id_of(PlayerChatMessage, V1_12_2), Some(0x0F));
        assert_eq!(registry.id_of(PlayerChatMessage, V1_19_4), Some(0x35));
        assert_eq!(
            registry.resolve(ConnectionPhase::Session, Direction::Clientbound, V1_19_1, 0x33),
            Some(PlayerChatMessage)
        );
    }

    #[test]
    fn test_creative_slot_follows_inserted_packets() {
        let registry = packet_registry().unwrap();
        assert_eq!(registry.id_of(SetCreativeModeSlot, V1_19_4), Some(0x2B));
        assert_eq!(registry.id_of(SetCreativeModeSlot, V1_20_2), Some(0x2E));
        assert_eq!(registry.id_of(SetCreativeModeSlot, V1_20_3), Some(0x2F));
        assert_eq!(registry.id_of(SetCreativeModeSlot, V1_20_5), Some(0x32));
        assert_eq!(
            registry.resolve(ConnectionPhase::Session, Direction::Serverbound, V1_20_2, 0x2B),
            None
        );
    }

    #[test]
    fn test_absent_packets() {
        let registry = packet_registry().unwrap();
        assert_eq!(registry.id_of(SystemChat, V1_18_2), None);
        assert_eq!(registry.id_of(LoginAcknowledged, V1_20), None);
        assert_eq!(registry.id_of(ClientInformation, V1_19_4), None);
        assert_eq!(
            registry.resolve(ConnectionPhase::Login, Direction::Serverbound, V1_20, 0x03),
            None
        );
        assert_eq!(
            registry.resolve(ConnectionPhase::Session, Direction::Clientbound, V1_21_4, 0x7F7F),
            None
        );
    }

    #[test]
    fn test_keep_alive_shares_id_across_phases() {
        let registry = packet_registry().unwrap();
        assert_eq!(
            registry.resolve(ConnectionPhase::Configuration, Direction::Clientbound, V1_21, 0x04),
            Some(ClientboundConfigKeepAlive)
        );
        assert_eq!(
            registry.resolve(ConnectionPhase::Session, Direction::Clientbound, V1_21, 0x26),
            Some(ClientboundKeepAlive)
        );
    }
}
