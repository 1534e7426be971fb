use crate::identity::PacketIdentity;
use crate::state::{ConnectionPhase, Direction};
use lodestone_data::DataError;
use lodestone_nbt::NbtError;
use lodestone_types::{InvalidIdentifier, ProtocolVersion, UnsupportedVersion};
use std::fmt;
use thiserror::Error;

/// Failures at the level of individual fields and primitives.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("VarInt too long")]
    VarIntTooLong,
    #[error("Not enough data")]
    NotEnoughData,
    #[error("Negative length {0}")]
    NegativeLength(i32),
    #[error("Declared length {declared} exceeds {remaining} remaining bytes")]
    LengthExceedsBuffer { declared: usize, remaining: usize },
    #[error("String too long: {len} > {max}")]
    StringTooLong { len: usize, max: usize },
    #[error("Invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("Invalid boolean byte 0x{0:02X}")]
    InvalidBool(u8),
    #[error("Invalid {what} value {value}")]
    InvalidEnum { what: &'static str, value: i32 },
    #[error("NBT error: {0}")]
    Nbt(#[from] NbtError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Identifier(#[from] InvalidIdentifier),
    #[error("Invalid UUID string: {0}")]
    InvalidUuid(#[from] uuid::Error),
    #[error("Unknown data component type {0}")]
    UnknownComponentType(i32),
    #[error("{registry} entry {name} does not exist in {version}")]
    UnmappedEntity {
        registry: &'static str,
        name: String,
        version: ProtocolVersion,
    },
    #[error("Field {0} is required in this version")]
    MissingField(&'static str),
    #[error("Field {field} does not exist in {version}")]
    FieldNotInVersion {
        field: &'static str,
        version: ProtocolVersion,
    },
    #[error("{what} value {value} out of range")]
    ValueOutOfRange { what: &'static str, value: i64 },
    #[error("{0} trailing bytes after packet")]
    TrailingBytes(usize),
    #[error(transparent)]
    Registry(#[from] DataError),
}

pub type CodecResult<T> = Result<T, CodecError>;

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::NotEnoughData
            | CodecError::LengthExceedsBuffer { .. }
            | CodecError::Nbt(NbtError::NotEnoughData)
            | CodecError::Nbt(NbtError::LengthExceedsBuffer { .. }) => ErrorKind::TruncatedBuffer,
            CodecError::MissingField(_)
            | CodecError::FieldNotInVersion { .. }
            | CodecError::UnmappedEntity { .. } => ErrorKind::UnsupportedVersionBracket,
            _ => ErrorKind::MalformedPrimitive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedPrimitive,
    TruncatedBuffer,
    UnrecognizedPacketIdentity,
    IllegalPhaseTransition,
    UnsupportedVersionBracket,
}

impl ErrorKind {
    /// Recoverable errors leave the connection usable: wait for more bytes,
    /// or forward the packet untouched.
    pub fn is_recoverable(self) -> bool {
        matches!(
            self,
            ErrorKind::TruncatedBuffer | ErrorKind::UnrecognizedPacketIdentity
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedPrimitive => "malformed primitive",
            ErrorKind::TruncatedBuffer => "truncated buffer",
            ErrorKind::UnrecognizedPacketIdentity => "unrecognized packet identity",
            ErrorKind::IllegalPhaseTransition => "illegal phase transition",
            ErrorKind::UnsupportedVersionBracket => "unsupported version bracket",
        };
        f.write_str(name)
    }
}

/// Where an error happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub phase: Option<ConnectionPhase>,
    pub direction: Option<Direction>,
    pub version: Option<ProtocolVersion>,
    pub identity: Option<PacketIdentity>,
    pub packet_id: Option<i32>,
    pub offset: Option<usize>,
}

impl ErrorContext {
    pub fn new(phase: ConnectionPhase, direction: Direction, version: ProtocolVersion) -> Self {
        Self {
            phase: Some(phase),
            direction: Some(direction),
            version: Some(version),
            ..Self::default()
        }
    }

    pub fn with_identity(mut self, identity: PacketIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_packet_id(mut self, id: i32) -> Self {
        self.packet_id = Some(id);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(phase) = self.phase {
            parts.push(format!("phase={}", phase));
        }
        if let Some(direction) = self.direction {
            parts.push(format!("direction={}", direction));
        }
        if let Some(version) = self.version {
            parts.push(format!("version={}", version));
        }
        if let Some(identity) = self.identity {
            parts.push(format!("packet={}", identity));
        }
        if let Some(id) = self.packet_id {
            parts.push(format!("id=0x{:02X}", id));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("offset={}", offset));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// The error returned at the codec boundary.
#[derive(Debug, Error)]
#[error("{kind} {context}{}", .source.as_ref().map(|s| format!(": {}", s)).unwrap_or_default())]
pub struct ProtocolError {
    pub kind: ErrorKind,
    pub context: ErrorContext,
    #[source]
    pub source: Option<CodecError>,
}

impl ProtocolError {
    pub fn new(kind: ErrorKind, context: ErrorContext) -> Self {
        Self {
            kind,
            context,
            source: None,
        }
    }

    pub fn codec(source: CodecError, context: ErrorContext) -> Self {
        Self {
            kind: source.kind(),
            context,
            source: Some(source),
        }
    }

    pub fn unsupported_version(err: UnsupportedVersion) -> Self {
        Self {
            kind: ErrorKind::UnsupportedVersionBracket,
            context: ErrorContext::default(),
            source: Some(CodecError::ValueOutOfRange {
                what: "protocol version",
                value: err.protocol as i64,
            }),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(CodecError::NotEnoughData.kind(), ErrorKind::TruncatedBuffer);
        assert_eq!(
            CodecError::Nbt(NbtError::NotEnoughData).kind(),
            ErrorKind::TruncatedBuffer
        );
        assert_eq!(CodecError::VarIntTooLong.kind(), ErrorKind::MalformedPrimitive);
        assert_eq!(
            CodecError::MissingField("index").kind(),
            ErrorKind::UnsupportedVersionBracket
        );
        assert!(ErrorKind::UnrecognizedPacketIdentity.is_recoverable());
        assert!(!ErrorKind::IllegalPhaseTransition.is_recoverable());
    }

    #[test]
    fn test_display_carries_context() {
        let context = ErrorContext::new(
            ConnectionPhase::Login,
            Direction::Serverbound,
            ProtocolVersion::V1_19,
        )
        .with_identity(PacketIdentity::LoginStart)
        .with_offset(7);
        let err = ProtocolError::codec(CodecError::NotEnoughData, context);
        let text = err.to_string();
        assert!(text.starts_with("truncated buffer"));
        assert!(text.contains("phase=login"));
        assert!(text.contains("offset=7"));
        assert!(text.contains("login.serverbound/hello"));
        assert!(err.is_recoverable());
    }
}
