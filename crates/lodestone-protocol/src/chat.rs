//! Building blocks shared by the chat packets.

use lodestone_data::registries;
use lodestone_nbt::NbtValue;
use lodestone_protocol_core::text::{read_text, write_text};
use lodestone_protocol_core::{CodecError, CodecResult, PacketReader, PacketWriter};
use lodestone_types::{Identifier, ProtocolVersion, TextComponent};
use uuid::Uuid;

/// Message signatures are fixed-size from 1.19.3.
pub const SIGNATURE_LEN: usize = 256;
pub const MAX_MESSAGE_LEN: usize = 256;
/// Size of the last-seen window, and of the acknowledgement bitset.
pub const LAST_SEEN_WINDOW: usize = 20;

/// Who a chat message is attributed to.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MessageSender {
    /// Before 1.16 chat carries no sender at all.
    #[default]
    Anonymous,
    Uuid(Uuid),
    /// From 1.19 the sender's name (and team) travel with the message.
    Profile {
        uuid: Uuid,
        display_name: TextComponent,
        team_name: Option<TextComponent>,
    },
}

impl MessageSender {
    pub fn uuid(&self) -> Option<Uuid> {
        match self {
            MessageSender::Anonymous => None,
            MessageSender::Uuid(uuid) | MessageSender::Profile { uuid, .. } => Some(*uuid),
        }
    }

    pub(crate) fn has_profile(&self) -> bool {
        matches!(self, MessageSender::Profile { .. })
    }

    pub(crate) fn has_team(&self) -> bool {
        matches!(
            self,
            MessageSender::Profile {
                team_name: Some(_),
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationParameter {
    Sender,
    Target,
    Content,
}

impl DecorationParameter {
    fn from_wire(value: i32) -> CodecResult<Self> {
        match value {
            0 => Ok(Self::Sender),
            1 => Ok(Self::Target),
            2 => Ok(Self::Content),
            _ => Err(CodecError::InvalidEnum {
                what: "decoration parameter",
                value,
            }),
        }
    }

    fn to_wire(self) -> i32 {
        match self {
            Self::Sender => 0,
            Self::Target => 1,
            Self::Content => 2,
        }
    }
}

/// How the client renders (or narrates) a message of some chat type.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatDecoration {
    pub translation_key: String,
    pub parameters: Vec<DecorationParameter>,
    pub style: NbtValue,
}

impl ChatDecoration {
    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        let translation_key = reader.read_string(32767)?;
        let parameters = reader.read_list(|r| DecorationParameter::from_wire(r.read_varint()?))?;
        let style = reader.read_nbt_required("style")?;
        Ok(Self {
            translation_key,
            parameters,
            style,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_string(&self.translation_key, 32767)?;
        writer.write_list(&self.parameters, |w, p| {
            w.write_varint(p.to_wire());
            Ok(())
        })?;
        writer.write_nbt(Some(&self.style))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTypeDefinition {
    pub chat: ChatDecoration,
    pub narration: ChatDecoration,
}

/// A chat type: a registry id, or (from 1.20.5) a definition sent inline.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatTypeRef {
    Id(i32),
    Inline(Box<ChatTypeDefinition>),
}

impl Default for ChatTypeRef {
    fn default() -> Self {
        ChatTypeRef::Id(0)
    }
}

impl ChatTypeRef {
    /// Look up the id `name` has in `version`.
    pub fn named(name: &Identifier, version: ProtocolVersion) -> CodecResult<Self> {
        let registry = &registries()?.chat_type;
        registry
            .get_id(version, name)
            .map(ChatTypeRef::Id)
            .ok_or_else(|| CodecError::UnmappedEntity {
                registry: registry.name(),
                name: name.to_string(),
                version,
            })
    }

    /// The registry name of an id reference.
    pub fn name(&self, version: ProtocolVersion) -> CodecResult<Option<Identifier>> {
        match self {
            ChatTypeRef::Id(id) => Ok(registries()?
                .chat_type
                .get_by_id(version, *id)
                .map(|entity| entity.name.clone())),
            ChatTypeRef::Inline(_) => Ok(None),
        }
    }

    fn require_id(&self, version: ProtocolVersion) -> CodecResult<i32> {
        match self {
            ChatTypeRef::Id(id) => Ok(*id),
            ChatTypeRef::Inline(_) => Err(CodecError::FieldNotInVersion {
                field: "inline chat type",
                version,
            }),
        }
    }

    /// Before 1.19: the chat position byte.
    pub(crate) fn read_position(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(ChatTypeRef::Id(reader.read_i8()? as i32))
    }

    pub(crate) fn write_position(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        let id = self.require_id(writer.version())?;
        let byte = i8::try_from(id).map_err(|_| CodecError::ValueOutOfRange {
            what: "chat position",
            value: id as i64,
        })?;
        writer.write_i8(byte);
        Ok(())
    }

    pub(crate) fn read_id(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(ChatTypeRef::Id(reader.read_varint()?))
    }

    pub(crate) fn write_id(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        let id = self.require_id(writer.version())?;
        writer.write_varint(id);
        Ok(())
    }

    /// 1.20.5+: `id + 1`, or `0` followed by an inline definition.
    pub(crate) fn read_holder(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        match reader.read_varint()? {
            0 => {
                let chat = ChatDecoration::read(reader)?;
                let narration = ChatDecoration::read(reader)?;
                Ok(ChatTypeRef::Inline(Box::new(ChatTypeDefinition {
                    chat,
                    narration,
                })))
            }
            n if n > 0 => Ok(ChatTypeRef::Id(n - 1)),
            n => Err(CodecError::ValueOutOfRange {
                what: "chat type id",
                value: n as i64,
            }),
        }
    }

    pub(crate) fn write_holder(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        match self {
            ChatTypeRef::Id(id) => {
                let wire = id.checked_add(1).filter(|n| *n > 0).ok_or(
                    CodecError::ValueOutOfRange {
                        what: "chat type id",
                        value: *id as i64,
                    },
                )?;
                writer.write_varint(wire);
                Ok(())
            }
            ChatTypeRef::Inline(def) => {
                writer.write_varint(0);
                def.chat.write(writer)?;
                def.narration.write(writer)
            }
        }
    }
}

/// Timestamp, salt and signature of a signed message.
///
/// The signature is mandatory in 1.19 to 1.19.2 and optional from 1.19.3.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageSignData {
    pub timestamp: i64,
    pub salt: i64,
    pub signature: Option<Vec<u8>>,
}

impl MessageSignData {
    pub(crate) fn require_signature(&self) -> CodecResult<&[u8]> {
        self.signature
            .as_deref()
            .ok_or(CodecError::MissingField("signature"))
    }

    /// 1.19.3+: an optional fixed-size signature.
    pub(crate) fn read_fixed_signature(reader: &mut PacketReader<'_>) -> CodecResult<Option<Vec<u8>>> {
        reader.read_optional(|r| r.read_fixed_bytes(SIGNATURE_LEN))
    }

    pub(crate) fn write_fixed_signature(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_optional(self.signature.as_ref(), |w, sig| {
            w.write_fixed_bytes(sig, SIGNATURE_LEN)
        })
    }
}

/// One entry of a client's last-seen acknowledgement list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastSeenMessage {
    /// 1.19.1 and 1.19.2: the sender and the full signature.
    Entry { sender: Uuid, signature: Vec<u8> },
    /// 1.19.3+: index into the receiver's signature cache.
    Cached(i32),
    /// 1.19.3+: a signature the receiver has not cached.
    Full(Vec<u8>),
}

impl LastSeenMessage {
    pub(crate) fn read_entry(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        let sender = reader.read_uuid()?;
        let signature = reader.read_byte_array()?;
        Ok(LastSeenMessage::Entry { sender, signature })
    }

    pub(crate) fn write_entry(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        match self {
            LastSeenMessage::Entry { sender, signature } => {
                writer.write_uuid(sender);
                writer.write_byte_array(signature);
                Ok(())
            }
            _ => Err(CodecError::FieldNotInVersion {
                field: "packed last seen",
                version: writer.version(),
            }),
        }
    }

    pub(crate) fn read_packed(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        match reader.read_varint()? {
            0 => Ok(LastSeenMessage::Full(reader.read_fixed_bytes(SIGNATURE_LEN)?)),
            n if n > 0 => Ok(LastSeenMessage::Cached(n - 1)),
            n => Err(CodecError::ValueOutOfRange {
                what: "last seen index",
                value: n as i64,
            }),
        }
    }

    pub(crate) fn write_packed(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        match self {
            LastSeenMessage::Cached(index) => {
                let wire = index.checked_add(1).filter(|n| *n > 0).ok_or(
                    CodecError::ValueOutOfRange {
                        what: "last seen index",
                        value: *index as i64,
                    },
                )?;
                writer.write_varint(wire);
                Ok(())
            }
            LastSeenMessage::Full(signature) => {
                writer.write_varint(0);
                writer.write_fixed_bytes(signature, SIGNATURE_LEN)
            }
            LastSeenMessage::Entry { .. } => Err(CodecError::FieldNotInVersion {
                field: "last seen entry",
                version: writer.version(),
            }),
        }
    }
}

/// Which parts of a message the server filtered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterMask {
    #[default]
    PassThrough,
    FullyFiltered,
    /// A bitset over the message characters, as longs.
    PartiallyFiltered(Vec<i64>),
}

impl FilterMask {
    pub(crate) fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        match reader.read_varint()? {
            0 => Ok(FilterMask::PassThrough),
            1 => Ok(FilterMask::FullyFiltered),
            2 => Ok(FilterMask::PartiallyFiltered(reader.read_list(|r| r.read_i64())?)),
            value => Err(CodecError::InvalidEnum {
                what: "filter mask",
                value,
            }),
        }
    }

    pub(crate) fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        match self {
            FilterMask::PassThrough => writer.write_varint(0),
            FilterMask::FullyFiltered => writer.write_varint(1),
            FilterMask::PartiallyFiltered(bits) => {
                writer.write_varint(2);
                writer.write_list(bits, |w, long| {
                    w.write_i64(*long);
                    Ok(())
                })?;
            }
        }
        Ok(())
    }
}

pub(crate) fn read_optional_text(reader: &mut PacketReader<'_>) -> CodecResult<Option<TextComponent>> {
    reader.read_optional(read_text)
}

pub(crate) fn write_optional_text(
    writer: &mut PacketWriter,
    text: Option<&TextComponent>,
) -> CodecResult<()> {
    writer.write_optional(text, write_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_nbt::nbt_compound;

    #[test]
    fn test_named_chat_type_follows_version() {
        let chat = Identifier::minecraft("chat");
        let legacy = ChatTypeRef::named(&chat, ProtocolVersion::V1_18_2).unwrap();
        let current = ChatTypeRef::named(&chat, ProtocolVersion::V1_21).unwrap();
        assert_eq!(legacy, ChatTypeRef::Id(0));
        assert_eq!(current.name(ProtocolVersion::V1_21).unwrap(), Some(chat));
    }

    #[test]
    fn test_unknown_chat_type_is_unmapped() {
        let err = ChatTypeRef::named(&Identifier::minecraft("shout"), ProtocolVersion::V1_21).unwrap_err();
        assert!(matches!(err, CodecError::UnmappedEntity { .. }));
    }

    #[test]
    fn test_inline_chat_type_holder() {
        let inline = ChatTypeRef::Inline(Box::new(ChatTypeDefinition {
            chat: ChatDecoration {
                translation_key: "chat.type.text".into(),
                parameters: vec![DecorationParameter::Sender, DecorationParameter::Content],
                style: nbt_compound! { "color" => NbtValue::String("gray".into()) },
            },
            narration: ChatDecoration {
                translation_key: "chat.type.text.narrate".into(),
                parameters: vec![DecorationParameter::Content],
                style: nbt_compound! {},
            },
        }));
        let mut writer = PacketWriter::new(ProtocolVersion::V1_21);
        inline.write_holder(&mut writer).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes[0], 0);

        let mut reader = PacketReader::new(&bytes, ProtocolVersion::V1_21);
        assert_eq!(ChatTypeRef::read_holder(&mut reader).unwrap(), inline);
        assert!(reader.is_empty());

        let mut writer = PacketWriter::new(ProtocolVersion::V1_20_3);
        assert!(matches!(
            inline.write_id(&mut writer),
            Err(CodecError::FieldNotInVersion { .. })
        ));
    }

    #[test]
    fn test_negative_holder_id_is_out_of_range() {
        for wire in [i32::MIN, -2, -1] {
            let mut writer = PacketWriter::new(ProtocolVersion::V1_21);
            writer.write_varint(wire);
            let bytes = writer.into_inner();
            let mut reader = PacketReader::new(&bytes, ProtocolVersion::V1_21);
            assert!(matches!(
                ChatTypeRef::read_holder(&mut reader),
                Err(CodecError::ValueOutOfRange { value, .. }) if value == wire as i64
            ));
        }

        let mut reader = PacketReader::new(&[0x05], ProtocolVersion::V1_21);
        assert_eq!(ChatTypeRef::read_holder(&mut reader).unwrap(), ChatTypeRef::Id(4));
    }

    #[test]
    fn test_packed_last_seen() {
        let entries = [LastSeenMessage::Cached(4), LastSeenMessage::Full(vec![9; SIGNATURE_LEN])];
        let mut writer = PacketWriter::new(ProtocolVersion::V1_19_3);
        for entry in &entries {
            entry.write_packed(&mut writer).unwrap();
        }
        let bytes = writer.into_inner();
        assert_eq!(bytes[0], 5);
        assert_eq!(bytes.len(), 1 + 1 + SIGNATURE_LEN);

        let mut reader = PacketReader::new(&bytes, ProtocolVersion::V1_19_3);
        assert_eq!(LastSeenMessage::read_packed(&mut reader).unwrap(), entries[0]);
        assert_eq!(LastSeenMessage::read_packed(&mut reader).unwrap(), entries[1]);
    }

    #[test]
    fn test_filter_mask_rejects_unknown_kind() {
        let mut reader = PacketReader::new(&[0x03], ProtocolVersion::V1_19_3);
        assert!(matches!(
            FilterMask::read(&mut reader),
            Err(CodecError::InvalidEnum { .. })
        ));
    }
}
