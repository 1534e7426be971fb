use crate::error::{ErrorContext, ErrorKind, ProtocolError};
use crate::identity::PacketIdentity;
use lodestone_types::ProtocolVersion;
use std::fmt;

/// The phase of a Minecraft protocol connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectionPhase {
    Handshake,
    Status,
    Login,
    Configuration,
    Session,
}

impl ConnectionPhase {
    pub const ALL: [ConnectionPhase; 5] = [
        ConnectionPhase::Handshake,
        ConnectionPhase::Status,
        ConnectionPhase::Login,
        ConnectionPhase::Configuration,
        ConnectionPhase::Session,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConnectionPhase::Handshake => "handshake",
            ConnectionPhase::Status => "status",
            ConnectionPhase::Login => "login",
            ConnectionPhase::Configuration => "configuration",
            ConnectionPhase::Session => "session",
        }
    }

    /// Whether `version` has this phase at all.
    pub fn exists_in(self, version: ProtocolVersion) -> bool {
        self != ConnectionPhase::Configuration || version >= ProtocolVersion::V1_20_2
    }

    /// The phase after `identity` has crossed the wire in `direction`.
    ///
    /// `intent` is only consulted for the handshake packet. Both ends of the
    /// transition must be phases `version` has.
    pub fn next(
        self,
        direction: Direction,
        identity: PacketIdentity,
        intent: Option<HandshakeIntent>,
        version: ProtocolVersion,
    ) -> Result<ConnectionPhase, ProtocolError> {
        let illegal = || {
            ProtocolError::new(
                ErrorKind::IllegalPhaseTransition,
                ErrorContext::new(self, direction, version).with_identity(identity),
            )
        };
        if identity.phase() != self || identity.direction() != direction || !self.exists_in(version) {
            return Err(illegal());
        }

        let next = match identity {
            PacketIdentity::Handshake => match intent {
                Some(HandshakeIntent::Status) => ConnectionPhase::Status,
                Some(HandshakeIntent::Login) | Some(HandshakeIntent::Transfer) => {
                    ConnectionPhase::Login
                }
                None => return Err(illegal()),
            },
            PacketIdentity::LoginSuccess if version < ProtocolVersion::V1_20_2 => {
                ConnectionPhase::Session
            }
            PacketIdentity::LoginAcknowledged => ConnectionPhase::Configuration,
            PacketIdentity::FinishConfigurationAck => ConnectionPhase::Session,
            PacketIdentity::ConfigurationAcknowledged => ConnectionPhase::Configuration,
            _ => self,
        };
        if !next.exists_in(version) {
            return Err(illegal());
        }

        if next != self {
            tracing::debug!("Phase {} -> {} on {}", self, next, identity);
        }
        Ok(next)
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Serverbound,
    Clientbound,
}

impl Direction {
    pub fn name(self) -> &'static str {
        match self {
            Direction::Serverbound => "serverbound",
            Direction::Clientbound => "clientbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The "next state" field of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeIntent {
    Status,
    Login,
    /// Reconnect after a server transfer (1.20.5+).
    Transfer,
}

impl HandshakeIntent {
    pub fn from_wire(value: i32, version: ProtocolVersion) -> Option<Self> {
        match value {
            1 => Some(HandshakeIntent::Status),
            2 => Some(HandshakeIntent::Login),
            3 if version >= ProtocolVersion::V1_20_5 => Some(HandshakeIntent::Transfer),
            _ => None,
        }
    }

    pub fn to_wire(self) -> i32 {
        match self {
            HandshakeIntent::Status => 1,
            HandshakeIntent::Login => 2,
            HandshakeIntent::Transfer => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionPhase::*;
    use Direction::*;
    use ProtocolVersion::*;

    #[test]
    fn test_handshake_intents() {
        let next = Handshake
            .next(Serverbound, PacketIdentity::Handshake, Some(HandshakeIntent::Login), V1_8)
            .unwrap();
        assert_eq!(next, Login);
        let next = Handshake
            .next(Serverbound, PacketIdentity::Handshake, Some(HandshakeIntent::Status), V1_21_4)
            .unwrap();
        assert_eq!(next, Status);
        let next = Handshake
            .next(Serverbound, PacketIdentity::Handshake, Some(HandshakeIntent::Transfer), V1_20_5)
            .unwrap();
        assert_eq!(next, Login);
        assert!(Handshake
            .next(Serverbound, PacketIdentity::Handshake, None, V1_8)
            .is_err());
    }

    #[test]
    fn test_login_success_before_configuration() {
        assert_eq!(
            Login
                .next(Clientbound, PacketIdentity::LoginSuccess, None, V1_20)
                .unwrap(),
            Session
        );
        assert_eq!(
            Login
                .next(Clientbound, PacketIdentity::LoginSuccess, None, V1_20_2)
                .unwrap(),
            Login
        );
    }

    #[test]
    fn test_configuration_round_trip() {
        let phase = Login
            .next(Serverbound, PacketIdentity::LoginAcknowledged, None, V1_21)
            .unwrap();
        assert_eq!(phase, Configuration);
        let phase = phase
            .next(Serverbound, PacketIdentity::FinishConfigurationAck, None, V1_21)
            .unwrap();
        assert_eq!(phase, Session);
        let phase = phase
            .next(Serverbound, PacketIdentity::ConfigurationAcknowledged, None, V1_21)
            .unwrap();
        assert_eq!(phase, Configuration);
    }

    #[test]
    fn test_non_transition_keeps_phase() {
        assert_eq!(
            Session
                .next(Clientbound, PacketIdentity::PlayerChatMessage, None, V1_19_4)
                .unwrap(),
            Session
        );
    }

    #[test]
    fn test_illegal_transitions() {
        let err = Handshake
            .next(Clientbound, PacketIdentity::PlayerChatMessage, None, V1_19_4)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalPhaseTransition);
        assert!(!err.is_recoverable());

        // Right phase, wrong direction.
        let err = Login
            .next(Serverbound, PacketIdentity::LoginSuccess, None, V1_19_4)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalPhaseTransition);
    }

    #[test]
    fn test_configuration_needs_1_20_2() {
        let err = Login
            .next(Serverbound, PacketIdentity::LoginAcknowledged, None, V1_19)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalPhaseTransition);
        assert_eq!(err.context.identity, Some(PacketIdentity::LoginAcknowledged));

        let err = Configuration
            .next(Serverbound, PacketIdentity::FinishConfigurationAck, None, V1_20)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalPhaseTransition);

        let err = Session
            .next(Serverbound, PacketIdentity::ConfigurationAcknowledged, None, V1_19_4)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalPhaseTransition);
    }

    #[test]
    fn test_transfer_intent_needs_1_20_5() {
        assert_eq!(HandshakeIntent::from_wire(3, V1_20_3), None);
        assert_eq!(
            HandshakeIntent::from_wire(3, V1_20_5),
            Some(HandshakeIntent::Transfer)
        );
        assert!(!Configuration.exists_in(V1_20));
        assert!(Configuration.exists_in(V1_20_2));
    }
}
