//! Protocol version definitions.
//!
//! Every wire-distinct protocol number gets one [`ProtocolVersion`] variant.
//! Releases that share a protocol number (1.20.3 and 1.20.4, for example) are
//! wire-identical aliases and collapse into a single variant. Variants are
//! declared oldest first, so the derived `Ord` is the protocol order.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

macro_rules! protocol_versions {
    ($($variant:ident => $protocol:literal, [$($name:literal),+ $(,)?];)*) => {
        /// A supported Minecraft: Java Edition protocol version.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum ProtocolVersion {
            $($variant,)*
        }

        impl ProtocolVersion {
            /// All supported versions, oldest first.
            pub const ALL: &'static [ProtocolVersion] = &[$(ProtocolVersion::$variant,)*];

            /// The raw protocol number sent in the handshake.
            pub const fn protocol(self) -> i32 {
                match self {
                    $(ProtocolVersion::$variant => $protocol,)*
                }
            }

            /// Release names sharing this protocol number, newest first.
            pub const fn names(self) -> &'static [&'static str] {
                match self {
                    $(ProtocolVersion::$variant => &[$($name),+],)*
                }
            }
        }
    };
}

protocol_versions! {
    V1_8 => 47, ["1.8.9", "1.8.8", "1.8"];
    V1_9 => 107, ["1.9"];
    V1_9_1 => 108, ["1.9.1"];
    V1_9_2 => 109, ["1.9.2"];
    V1_9_4 => 110, ["1.9.4", "1.9.3"];
    V1_10 => 210, ["1.10.2", "1.10.1", "1.10"];
    V1_11 => 315, ["1.11"];
    V1_11_1 => 316, ["1.11.2", "1.11.1"];
    V1_12 => 335, ["1.12"];
    V1_12_1 => 338, ["1.12.1"];
    V1_12_2 => 340, ["1.12.2"];
    V1_13 => 393, ["1.13"];
    V1_13_1 => 401, ["1.13.1"];
    V1_13_2 => 404, ["1.13.2"];
    V1_14 => 477, ["1.14"];
    V1_14_1 => 480, ["1.14.1"];
    V1_14_2 => 485, ["1.14.2"];
    V1_14_3 => 490, ["1.14.3"];
    V1_14_4 => 498, ["1.14.4"];
    V1_15 => 573, ["1.15"];
    V1_15_1 => 575, ["1.15.1"];
    V1_15_2 => 578, ["1.15.2"];
    V1_16 => 735, ["1.16"];
    V1_16_1 => 736, ["1.16.1"];
    V1_16_2 => 751, ["1.16.2"];
    V1_16_3 => 753, ["1.16.3"];
    V1_16_4 => 754, ["1.16.5", "1.16.4"];
    V1_17 => 755, ["1.17"];
    V1_17_1 => 756, ["1.17.1"];
    V1_18 => 757, ["1.18.1", "1.18"];
    V1_18_2 => 758, ["1.18.2"];
    V1_19 => 759, ["1.19"];
    V1_19_1 => 760, ["1.19.2", "1.19.1"];
    V1_19_3 => 761, ["1.19.3"];
    V1_19_4 => 762, ["1.19.4"];
    V1_20 => 763, ["1.20.1", "1.20"];
    V1_20_2 => 764, ["1.20.2"];
    V1_20_3 => 765, ["1.20.4", "1.20.3"];
    V1_20_5 => 766, ["1.20.6", "1.20.5"];
    V1_21 => 767, ["1.21.1", "1.21"];
    V1_21_2 => 768, ["1.21.3", "1.21.2"];
    V1_21_4 => 769, ["1.21.4"];
}

/// How [`ProtocolVersion::resolve`] treats protocol numbers with no exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionClamp {
    /// Only exact protocol numbers are accepted.
    #[default]
    Strict,
    /// Numbers above the newest supported version are clamped down to it.
    Newest,
}

/// A protocol number that maps to no supported version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported protocol version {protocol}")]
pub struct UnsupportedVersion {
    pub protocol: i32,
}

impl ProtocolVersion {
    pub const OLDEST: ProtocolVersion = ProtocolVersion::V1_8;
    pub const NEWEST: ProtocolVersion = ProtocolVersion::V1_21_4;

    /// Look up the variant for an exact protocol number.
    pub fn from_protocol(protocol: i32) -> Option<Self> {
        Self::ALL
            .binary_search_by_key(&protocol, |v| v.protocol())
            .ok()
            .map(|idx| Self::ALL[idx])
    }

    /// Resolve a handshake protocol number under the given clamp policy.
    pub fn resolve(protocol: i32, clamp: VersionClamp) -> Result<Self, UnsupportedVersion> {
        if let Some(version) = Self::from_protocol(protocol) {
            return Ok(version);
        }
        match clamp {
            VersionClamp::Newest if protocol > Self::NEWEST.protocol() => {
                tracing::warn!(
                    "Clamping protocol {} to {} ({})",
                    protocol,
                    Self::NEWEST.protocol(),
                    Self::NEWEST.name()
                );
                Ok(Self::NEWEST)
            }
            _ => Err(UnsupportedVersion { protocol }),
        }
    }

    /// The primary release name (e.g. "1.20.4").
    pub const fn name(self) -> &'static str {
        self.names()[0]
    }

    pub fn is_at_least(self, other: ProtocolVersion) -> bool {
        self >= other
    }

    pub fn is_older_than(self, other: ProtocolVersion) -> bool {
        self < other
    }

    /// Position in [`ProtocolVersion::ALL`].
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.protocol())
    }
}

/// A half-open span of versions, `[since, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    pub since: ProtocolVersion,
    pub until: Option<ProtocolVersion>,
}

impl VersionRange {
    /// Every supported version.
    pub const ALL: VersionRange = VersionRange {
        since: ProtocolVersion::OLDEST,
        until: None,
    };

    /// `[since, newest]`.
    pub const fn since(since: ProtocolVersion) -> Self {
        Self { since, until: None }
    }

    /// `[oldest, until)`.
    pub const fn until(until: ProtocolVersion) -> Self {
        Self {
            since: ProtocolVersion::OLDEST,
            until: Some(until),
        }
    }

    /// `[since, until)`.
    pub const fn between(since: ProtocolVersion, until: ProtocolVersion) -> Self {
        Self {
            since,
            until: Some(until),
        }
    }

    pub fn contains(&self, version: ProtocolVersion) -> bool {
        version >= self.since && self.until.map_or(true, |until| version < until)
    }

    pub fn is_empty(&self) -> bool {
        self.until.is_some_and(|until| until <= self.since)
    }

    pub fn overlaps(&self, other: &VersionRange) -> bool {
        let starts_before_other_ends = other.until.map_or(true, |end| self.since < end);
        let other_starts_before_end = self.until.map_or(true, |end| other.since < end);
        starts_before_other_ends && other_starts_before_end
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.until {
            Some(until) => write!(f, "[{}, {})", self.since.name(), until.name()),
            None => write!(f, "[{}, ..)", self.since.name()),
        }
    }
}
