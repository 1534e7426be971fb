use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A block position in the world (x, y, z integers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Encode as a 64-bit long (1.14+ layout).
    /// x: 26 bits, z: 26 bits, y: 12 bits
    pub fn encode(&self) -> u64 {
        ((self.x as u64 & 0x3FFFFFF) << 38)
            | ((self.z as u64 & 0x3FFFFFF) << 12)
            | (self.y as u64 & 0xFFF)
    }

    pub fn decode(val: u64) -> Self {
        let x = sign_extend((val >> 38) as i32, 26);
        let z = sign_extend(((val >> 12) & 0x3FFFFFF) as i32, 26);
        let y = sign_extend((val & 0xFFF) as i32, 12);
        Self { x, y, z }
    }

    /// Encode as a 64-bit long (pre-1.14 layout).
    /// x: 26 bits, y: 12 bits, z: 26 bits
    pub fn encode_legacy(&self) -> u64 {
        ((self.x as u64 & 0x3FFFFFF) << 38)
            | ((self.y as u64 & 0xFFF) << 26)
            | (self.z as u64 & 0x3FFFFFF)
    }

    pub fn decode_legacy(val: u64) -> Self {
        let x = sign_extend((val >> 38) as i32, 26);
        let y = sign_extend(((val >> 26) & 0xFFF) as i32, 12);
        let z = sign_extend((val & 0x3FFFFFF) as i32, 26);
        Self { x, y, z }
    }
}

fn sign_extend(value: i32, bits: u32) -> i32 {
    if value >= 1 << (bits - 1) {
        value - (1 << bits)
    } else {
        value
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier {0:?}")]
pub struct InvalidIdentifier(pub String);

/// A Minecraft resource identifier (e.g., "minecraft:stone").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    pub namespace: String,
    pub path: String,
}

impl Identifier {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn minecraft(path: impl Into<String>) -> Self {
        Self::new("minecraft", path)
    }

    /// Parse and validate `namespace:path`. A bare path gets the
    /// `minecraft` namespace.
    pub fn parse(s: &str) -> Result<Self, InvalidIdentifier> {
        let (namespace, path) = s.split_once(':').unwrap_or(("minecraft", s));
        let namespace_ok = !namespace.is_empty()
            && namespace
                .bytes()
                .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.'));
        let path_ok = !path.is_empty()
            && path
                .bytes()
                .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b'/'));
        if namespace_ok && path_ok {
            Ok(Self::new(namespace, path))
        } else {
            Err(InvalidIdentifier(s.to_string()))
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl std::str::FromStr for Identifier {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A signed property (usually `textures`) of a player's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

/// Rich chat text. Style keys the struct does not model (translate, click
/// events, fonts, ...) are kept in `other` so nothing is lost in transit.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TextComponent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfuscated: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<TextComponent>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// True when the component is just literal text with no styling.
    pub fn is_plain(&self) -> bool {
        self.color.is_none()
            && self.bold.is_none()
            && self.italic.is_none()
            && self.underlined.is_none()
            && self.strikethrough.is_none()
            && self.obfuscated.is_none()
            && self.extra.is_empty()
            && self.other.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"text":""}"#.to_string())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Wire JSON accepts a bare string, an array (first element is the parent,
/// the rest become `extra`), or a full object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawComponent {
    Plain(String),
    List(Vec<TextComponent>),
    Full(Box<FullComponent>),
}

#[derive(Deserialize)]
struct FullComponent {
    #[serde(default)]
    text: String,
    color: Option<String>,
    bold: Option<bool>,
    italic: Option<bool>,
    underlined: Option<bool>,
    strikethrough: Option<bool>,
    obfuscated: Option<bool>,
    #[serde(default)]
    extra: Vec<TextComponent>,
    #[serde(flatten)]
    other: serde_json::Map<String, serde_json::Value>,
}

impl<'de> Deserialize<'de> for TextComponent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match RawComponent::deserialize(deserializer)? {
            RawComponent::Plain(text) => Ok(TextComponent::plain(text)),
            RawComponent::List(mut parts) => {
                if parts.is_empty() {
                    return Err(serde::de::Error::custom("empty text component list"));
                }
                let mut head = parts.remove(0);
                head.extra.extend(parts);
                Ok(head)
            }
            RawComponent::Full(full) => {
                let full = *full;
                Ok(TextComponent {
                    text: full.text,
                    color: full.color,
                    bold: full.bold,
                    italic: full.italic,
                    underlined: full.underlined,
                    strikethrough: full.strikethrough,
                    obfuscated: full.obfuscated,
                    extra: full.extra,
                    other: full.other,
                })
            }
        }
    }
}
