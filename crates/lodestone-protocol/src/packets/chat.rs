//! Chat in both directions, from unsigned 1.8 chat to the packed
//! signature cache of 1.19.3+.

use crate::chat::{
    read_optional_text, write_optional_text, ChatTypeRef, FilterMask, LastSeenMessage,
    MessageSender, MessageSignData, LAST_SEEN_WINDOW, MAX_MESSAGE_LEN, SIGNATURE_LEN,
};
use lodestone_protocol_core::text::{read_text, write_text};
use lodestone_protocol_core::{
    CodecError, CodecResult, Field, Gated, Layout, PacketReader, PacketWriter,
};
use lodestone_types::{ProtocolVersion, TextComponent, VersionRange};
use uuid::Uuid;

use lodestone_types::ProtocolVersion::*;

const LEGACY_MESSAGE_LEN: usize = 100;

/// Chat typed by the player.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerboundChatMessage {
    pub message: String,
    /// 1.19+. The signature is mandatory up to 1.19.2.
    pub sign_data: Gated<MessageSignData>,
    /// 1.19 to 1.19.2.
    pub signed_preview: Gated<bool>,
    /// 1.19.1 and 1.19.2.
    pub last_seen: Gated<Vec<LastSeenMessage>>,
    /// 1.19.1 and 1.19.2.
    pub last_received: Gated<Option<LastSeenMessage>>,
    /// 1.19.3+.
    pub message_count: Gated<i32>,
    /// 1.19.3+: bitset over the last-seen window.
    pub acknowledged: Gated<Vec<u8>>,
}

fn update_sign_data(sign_data: &mut Gated<MessageSignData>, f: impl FnOnce(&mut MessageSignData)) {
    let mut data = std::mem::take(sign_data).into_option().unwrap_or_default();
    f(&mut data);
    *sign_data = Gated::Present(data);
}

fn read_last_seen_entries(
    reader: &mut PacketReader<'_>,
) -> CodecResult<Vec<LastSeenMessage>> {
    reader.read_list_max(LAST_SEEN_WINDOW, LastSeenMessage::read_entry)
}

fn write_last_seen_entries(writer: &mut PacketWriter, entries: &[LastSeenMessage]) -> CodecResult<()> {
    writer.write_list(entries, |w, entry| entry.write_entry(w))
}

fn read_packed_last_seen(
    reader: &mut PacketReader<'_>,
) -> CodecResult<Vec<LastSeenMessage>> {
    reader.read_list_max(LAST_SEEN_WINDOW, LastSeenMessage::read_packed)
}

fn write_packed_last_seen(writer: &mut PacketWriter, entries: &[LastSeenMessage]) -> CodecResult<()> {
    writer.write_list(entries, |w, entry| entry.write_packed(w))
}

pub(crate) static SERVERBOUND_CHAT_MESSAGE: Layout<ServerboundChatMessage> = Layout::new(
    "serverbound_chat_message",
    &[
        Field::new(
            "message",
            VersionRange::until(V1_11),
            |r, p| {
                p.message = r.read_string(LEGACY_MESSAGE_LEN)?;
                Ok(())
            },
            |w, p| w.write_string(&p.message, LEGACY_MESSAGE_LEN),
        ),
        Field::new(
            "message",
            VersionRange::since(V1_11),
            |r, p| {
                p.message = r.read_string(MAX_MESSAGE_LEN)?;
                Ok(())
            },
            |w, p| w.write_string(&p.message, MAX_MESSAGE_LEN),
        ),
        Field::gated(
            "sign_data",
            VersionRange::since(V1_19),
            |r, p| {
                let (timestamp, salt) = (r.read_i64()?, r.read_i64()?);
                update_sign_data(&mut p.sign_data, |data| {
                    data.timestamp = timestamp;
                    data.salt = salt;
                });
                Ok(())
            },
            |w, p| {
                let data = p.sign_data.require("sign_data")?;
                w.write_i64(data.timestamp);
                w.write_i64(data.salt);
                Ok(())
            },
            |p| p.sign_data.is_present(),
        ),
        Field::new(
            "signature",
            VersionRange::between(V1_19, V1_19_3),
            |r, p| {
                let signature = r.read_byte_array()?;
                update_sign_data(&mut p.sign_data, |data| data.signature = Some(signature));
                Ok(())
            },
            |w, p| {
                let data = p.sign_data.require("sign_data")?;
                w.write_byte_array(data.require_signature()?);
                Ok(())
            },
        ),
        Field::new(
            "signature",
            VersionRange::since(V1_19_3),
            |r, p| {
                let signature = MessageSignData::read_fixed_signature(r)?;
                update_sign_data(&mut p.sign_data, |data| data.signature = signature);
                Ok(())
            },
            |w, p| p.sign_data.require("sign_data")?.write_fixed_signature(w),
        ),
        Field::gated(
            "signed_preview",
            VersionRange::between(V1_19, V1_19_3),
            |r, p| {
                p.signed_preview = Gated::Present(r.read_bool()?);
                Ok(())
            },
            |w, p| {
                w.write_bool(*p.signed_preview.require("signed_preview")?);
                Ok(())
            },
            |p| p.signed_preview.is_present(),
        ),
        Field::gated(
            "last_seen",
            VersionRange::between(V1_19_1, V1_19_3),
            |r, p| {
                p.last_seen = Gated::Present(read_last_seen_entries(r)?);
                Ok(())
            },
            |w, p| write_last_seen_entries(w, p.last_seen.require("last_seen")?),
            |p| p.last_seen.is_present(),
        ),
        Field::gated(
            "last_received",
            VersionRange::between(V1_19_1, V1_19_3),
            |r, p| {
                p.last_received = Gated::Present(r.read_optional(LastSeenMessage::read_entry)?);
                Ok(())
            },
            |w, p| {
                let last = p.last_received.require("last_received")?;
                w.write_optional(last.as_ref(), |w, entry| entry.write_entry(w))
            },
            |p| p.last_received.is_present(),
        ),
        Field::gated(
            "message_count",
            VersionRange::since(V1_19_3),
            |r, p| {
                p.message_count = Gated::Present(r.read_varint()?);
                Ok(())
            },
            |w, p| {
                w.write_varint(*p.message_count.require("message_count")?);
                Ok(())
            },
            |p| p.message_count.is_present(),
        ),
        Field::gated(
            "acknowledged",
            VersionRange::since(V1_19_3),
            |r, p| {
                p.acknowledged = Gated::Present(r.read_fixed_bitset(LAST_SEEN_WINDOW)?);
                Ok(())
            },
            |w, p| w.write_fixed_bitset(p.acknowledged.require("acknowledged")?, LAST_SEEN_WINDOW),
            |p| p.acknowledged.is_present(),
        ),
    ],
);

layout_packet!(ServerboundChatMessage, SERVERBOUND_CHAT_MESSAGE);

/// Player chat as the client receives it.
///
/// Six wire brackets: unsigned chat before 1.16, unsigned chat with a sender
/// UUID to 1.18.2, then 1.19, 1.19.1, 1.19.3 and 1.20.5 signed chat.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerChatMessage {
    /// The rendered message, before 1.19.1.
    pub content: Gated<TextComponent>,
    /// The raw signed text, from 1.19.1.
    pub plain_content: Gated<String>,
    /// 1.19.1 and 1.19.2: the decorated text, when it differs.
    pub formatted_content: Gated<Option<TextComponent>>,
    /// 1.19+.
    pub unsigned_content: Gated<Option<TextComponent>>,
    pub chat_type: ChatTypeRef,
    pub sender: MessageSender,
    /// 1.19+.
    pub sign_data: Gated<MessageSignData>,
    /// 1.19.1 and 1.19.2: the previous message's signature.
    pub previous_signature: Gated<Option<Vec<u8>>>,
    /// 1.19.3+: position in the sender's message chain.
    pub index: Gated<i32>,
    /// 1.19.1+.
    pub last_seen: Gated<Vec<LastSeenMessage>>,
    /// 1.19.1+.
    pub filter: Gated<FilterMask>,
}

fn read_sender_uuid(
    reader: &mut PacketReader<'_>,
    p: &mut PlayerChatMessage,
) -> CodecResult<()> {
    p.sender = MessageSender::Uuid(reader.read_uuid()?);
    Ok(())
}

fn write_sender_uuid(writer: &mut PacketWriter, p: &PlayerChatMessage) -> CodecResult<()> {
    let uuid = p.sender.uuid().ok_or(CodecError::MissingField("sender"))?;
    writer.write_uuid(&uuid);
    Ok(())
}

fn write_chat_type(writer: &mut PacketWriter, p: &PlayerChatMessage) -> CodecResult<()> {
    let version = writer.version();
    if version < V1_19 {
        p.chat_type.write_position(writer)
    } else if version < V1_20_5 {
        p.chat_type.write_id(writer)
    } else {
        p.chat_type.write_holder(writer)
    }
}

pub(crate) static PLAYER_CHAT_MESSAGE: Layout<PlayerChatMessage> = Layout::new(
    "player_chat_message",
    &[
        Field::gated(
            "content",
            VersionRange::until(V1_19_1),
            |r, p| {
                p.content = Gated::Present(read_text(r)?);
                Ok(())
            },
            |w, p| write_text(w, p.content.require("content")?),
            |p| p.content.is_present(),
        ),
        Field::gated(
            "unsigned_content",
            VersionRange::between(V1_19, V1_19_1),
            |r, p| {
                p.unsigned_content = Gated::Present(read_optional_text(r)?);
                Ok(())
            },
            |w, p| write_optional_text(w, p.unsigned_content.require("unsigned_content")?.as_ref()),
            |p| p.unsigned_content.is_present(),
        ),
        Field::gated(
            "previous_signature",
            VersionRange::between(V1_19_1, V1_19_3),
            |r, p| {
                p.previous_signature = Gated::Present(r.read_optional(|r| r.read_byte_array())?);
                Ok(())
            },
            |w, p| {
                let previous = p.previous_signature.require("previous_signature")?;
                w.write_optional(previous.as_ref(), |w, sig| {
                    w.write_byte_array(sig);
                    Ok(())
                })
            },
            |p| p.previous_signature.is_present(),
        ),
        Field::new(
            "sender",
            VersionRange::since(V1_19_1),
            read_sender_uuid,
            write_sender_uuid,
        ),
        Field::gated(
            "index",
            VersionRange::since(V1_19_3),
            |r, p| {
                p.index = Gated::Present(r.read_varint()?);
                Ok(())
            },
            |w, p| {
                w.write_varint(*p.index.require("index")?);
                Ok(())
            },
            |p| p.index.is_present(),
        ),
        Field::new(
            "signature",
            VersionRange::between(V1_19_1, V1_19_3),
            |r, p| {
                let signature = r.read_byte_array()?;
                update_sign_data(&mut p.sign_data, |data| data.signature = Some(signature));
                Ok(())
            },
            |w, p| {
                let data = p.sign_data.require("sign_data")?;
                w.write_byte_array(data.require_signature()?);
                Ok(())
            },
        ),
        Field::new(
            "signature",
            VersionRange::since(V1_19_3),
            |r, p| {
                let signature = MessageSignData::read_fixed_signature(r)?;
                update_sign_data(&mut p.sign_data, |data| data.signature = signature);
                Ok(())
            },
            |w, p| p.sign_data.require("sign_data")?.write_fixed_signature(w),
        ),
        Field::gated(
            "plain_content",
            VersionRange::since(V1_19_1),
            |r, p| {
                p.plain_content = Gated::Present(r.read_string(MAX_MESSAGE_LEN)?);
                Ok(())
            },
            |w, p| w.write_string(p.plain_content.require("plain_content")?, MAX_MESSAGE_LEN),
            |p| p.plain_content.is_present(),
        ),
        Field::gated(
            "formatted_content",
            VersionRange::between(V1_19_1, V1_19_3),
            |r, p| {
                p.formatted_content = Gated::Present(read_optional_text(r)?);
                Ok(())
            },
            |w, p| write_optional_text(w, p.formatted_content.require("formatted_content")?.as_ref()),
            |p| p.formatted_content.is_present(),
        ),
        Field::gated(
            "sign_data",
            VersionRange::since(V1_19_1),
            |r, p| {
                let (timestamp, salt) = (r.read_i64()?, r.read_i64()?);
                update_sign_data(&mut p.sign_data, |data| {
                    data.timestamp = timestamp;
                    data.salt = salt;
                });
                Ok(())
            },
            |w, p| {
                let data = p.sign_data.require("sign_data")?;
                w.write_i64(data.timestamp);
                w.write_i64(data.salt);
                Ok(())
            },
            |p| p.sign_data.is_present(),
        ),
        Field::gated(
            "last_seen",
            VersionRange::between(V1_19_1, V1_19_3),
            |r, p| {
                p.last_seen = Gated::Present(read_last_seen_entries(r)?);
                Ok(())
            },
            |w, p| write_last_seen_entries(w, p.last_seen.require("last_seen")?),
            |p| p.last_seen.is_present(),
        ),
        Field::gated(
            "last_seen",
            VersionRange::since(V1_19_3),
            |r, p| {
                p.last_seen = Gated::Present(read_packed_last_seen(r)?);
                Ok(())
            },
            |w, p| write_packed_last_seen(w, p.last_seen.require("last_seen")?),
            |p| p.last_seen.is_present(),
        ),
        Field::gated(
            "unsigned_content",
            VersionRange::since(V1_19_1),
            |r, p| {
                p.unsigned_content = Gated::Present(read_optional_text(r)?);
                Ok(())
            },
            |w, p| write_optional_text(w, p.unsigned_content.require("unsigned_content")?.as_ref()),
            |p| p.unsigned_content.is_present(),
        ),
        Field::gated(
            "filter",
            VersionRange::since(V1_19_1),
            |r, p| {
                p.filter = Gated::Present(FilterMask::read(r)?);
                Ok(())
            },
            |w, p| p.filter.require("filter")?.write(w),
            |p| p.filter.is_present(),
        ),
        Field::new(
            "chat_type",
            VersionRange::until(V1_19),
            |r, p| {
                p.chat_type = ChatTypeRef::read_position(r)?;
                Ok(())
            },
            write_chat_type,
        ),
        Field::new(
            "chat_type",
            VersionRange::between(V1_19, V1_20_5),
            |r, p| {
                p.chat_type = ChatTypeRef::read_id(r)?;
                Ok(())
            },
            write_chat_type,
        ),
        Field::new(
            "chat_type",
            VersionRange::since(V1_20_5),
            |r, p| {
                p.chat_type = ChatTypeRef::read_holder(r)?;
                Ok(())
            },
            write_chat_type,
        ),
        Field::new(
            "sender",
            VersionRange::until(V1_16),
            |_, p| {
                p.sender = MessageSender::Anonymous;
                Ok(())
            },
            |w, p| match p.sender {
                MessageSender::Anonymous => Ok(()),
                _ => Err(CodecError::FieldNotInVersion {
                    field: "sender",
                    version: w.version(),
                }),
            },
        ),
        Field::new(
            "sender",
            VersionRange::between(V1_16, V1_19_1),
            read_sender_uuid,
            write_sender_uuid,
        ),
        Field::gated(
            "sender_name",
            VersionRange::since(V1_19),
            |r, p| {
                let display_name = read_text(r)?;
                let uuid = p.sender.uuid().unwrap_or_else(Uuid::nil);
                p.sender = MessageSender::Profile {
                    uuid,
                    display_name,
                    team_name: None,
                };
                Ok(())
            },
            |w, p| match &p.sender {
                MessageSender::Profile { display_name, .. } => write_text(w, display_name),
                _ => Err(CodecError::MissingField("sender_name")),
            },
            |p| p.sender.has_profile(),
        ),
        Field::gated(
            "team_name",
            VersionRange::since(V1_19),
            |r, p| {
                let team = read_optional_text(r)?;
                if let MessageSender::Profile { team_name, .. } = &mut p.sender {
                    *team_name = team;
                }
                Ok(())
            },
            |w, p| match &p.sender {
                MessageSender::Profile { team_name, .. } => write_optional_text(w, team_name.as_ref()),
                _ => Err(CodecError::MissingField("team_name")),
            },
            |p| p.sender.has_team(),
        ),
        Field::gated(
            "sign_data",
            VersionRange::between(V1_19, V1_19_1),
            |r, p| {
                let (timestamp, salt) = (r.read_i64()?, r.read_i64()?);
                let signature = r.read_byte_array()?;
                update_sign_data(&mut p.sign_data, |data| {
                    data.timestamp = timestamp;
                    data.salt = salt;
                    data.signature = Some(signature);
                });
                Ok(())
            },
            |w, p| {
                let data = p.sign_data.require("sign_data")?;
                w.write_i64(data.timestamp);
                w.write_i64(data.salt);
                w.write_byte_array(data.require_signature()?);
                Ok(())
            },
            |p| p.sign_data.is_present(),
        ),
    ],
);

layout_packet!(PlayerChatMessage, PLAYER_CHAT_MESSAGE);

/// Server-originated chat (1.19+).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemChat {
    pub content: TextComponent,
    /// 1.19 only: the chat type id.
    pub kind: Gated<i32>,
    /// 1.19.1+: show above the hotbar instead of in chat.
    pub overlay: Gated<bool>,
}

pub(crate) static SYSTEM_CHAT: Layout<SystemChat> = Layout::new(
    "system_chat",
    &[
        Field::new(
            "content",
            VersionRange::ALL,
            |r, p| {
                p.content = read_text(r)?;
                Ok(())
            },
            |w, p| write_text(w, &p.content),
        ),
        Field::gated(
            "kind",
            VersionRange::between(V1_19, V1_19_1),
            |r, p| {
                p.kind = Gated::Present(r.read_varint()?);
                Ok(())
            },
            |w, p| {
                w.write_varint(*p.kind.require("kind")?);
                Ok(())
            },
            |p| p.kind.is_present(),
        ),
        Field::gated(
            "overlay",
            VersionRange::since(V1_19_1),
            |r, p| {
                p.overlay = Gated::Present(r.read_bool()?);
                Ok(())
            },
            |w, p| {
                w.write_bool(*p.overlay.require("overlay")?);
                Ok(())
            },
            |p| p.overlay.is_present(),
        ),
    ],
);

layout_packet!(SystemChat, SYSTEM_CHAT);

/// Signed chat the server relays on behalf of a player, shaped for `version`.
///
/// Fields a version does not carry stay absent; optional signature parts are
/// left empty for the caller to fill in.
pub fn player_chat(
    version: ProtocolVersion,
    sender: MessageSender,
    message: &str,
    chat_type: ChatTypeRef,
) -> PlayerChatMessage {
    let mut chat = PlayerChatMessage {
        chat_type,
        sender,
        ..PlayerChatMessage::default()
    };
    if version < V1_19_1 {
        chat.content = Gated::Present(TextComponent::plain(message));
    } else {
        chat.plain_content = Gated::Present(message.to_string());
        chat.last_seen = Gated::Present(Vec::new());
        chat.filter = Gated::Present(FilterMask::PassThrough);
    }
    if version >= V1_19 {
        chat.unsigned_content = Gated::Present(None);
        chat.sign_data = Gated::Present(MessageSignData {
            signature: (version < V1_19_3).then(|| vec![0; SIGNATURE_LEN]),
            ..MessageSignData::default()
        });
    }
    if (V1_19_1..V1_19_3).contains(&version) {
        chat.previous_signature = Gated::Present(None);
        chat.formatted_content = Gated::Present(None);
    }
    if version >= V1_19_3 {
        chat.index = Gated::Present(0);
    }
    chat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::testing::{encode, round_trip};
    use lodestone_protocol_core::PacketData;

    fn alex() -> Uuid {
        Uuid::from_u128(0x853c80ef3c3749fdaa49938b674adae6)
    }

    fn profile() -> MessageSender {
        MessageSender::Profile {
            uuid: alex(),
            display_name: TextComponent::plain("Alex"),
            team_name: None,
        }
    }

    #[test]
    fn test_pre_signing_chat_has_no_signature_bytes() {
        let chat = player_chat(V1_18_2, MessageSender::Uuid(alex()), "hello", ChatTypeRef::Id(0));
        let bytes = round_trip(&chat, V1_18_2);
        let json = br#"{"text":"hello"}"#;
        // length prefix, JSON, position byte, sender UUID: nothing else.
        assert_eq!(bytes.len(), 1 + json.len() + 1 + 16);
        assert_eq!(&bytes[1..1 + json.len()], json);

        // Trailing signature-shaped bytes are never consumed.
        let mut padded = bytes.clone();
        padded.extend_from_slice(&[0u8; 24]);
        let mut reader = PacketReader::new(&padded, V1_18_2);
        assert_eq!(PlayerChatMessage::read(&mut reader).unwrap(), chat);
        assert_eq!(reader.remaining(), 24);
    }

    #[test]
    fn test_anonymous_chat_before_1_16() {
        let chat = player_chat(V1_8, MessageSender::Anonymous, "hi", ChatTypeRef::Id(1));
        let bytes = round_trip(&chat, V1_8);
        assert_eq!(*bytes.last().unwrap(), 1);

        let named = player_chat(V1_8, MessageSender::Uuid(alex()), "hi", ChatTypeRef::Id(1));
        let mut writer = PacketWriter::new(V1_8);
        assert!(matches!(
            named.write(&mut writer),
            Err(CodecError::FieldNotInVersion { field: "sender", .. })
        ));
    }

    #[test]
    fn test_each_signed_bracket_survives() {
        for version in [V1_19, V1_19_1, V1_19_3, V1_20_3, V1_20_5, V1_21_4] {
            let mut chat = player_chat(version, profile(), "hello", ChatTypeRef::Id(0));
            if let MessageSender::Profile { team_name, .. } = &mut chat.sender {
                *team_name = Some(TextComponent::plain("red"));
            }
            round_trip(&chat, version);
        }
    }

    #[test]
    fn test_1_19_field_order() {
        let mut chat = player_chat(V1_19, profile(), "hi", ChatTypeRef::Id(0));
        if let Gated::Present(data) = &mut chat.sign_data {
            data.timestamp = 1;
            data.salt = 2;
            data.signature = Some(vec![0xAB; 4]);
        }
        let bytes = encode(&chat, V1_19);
        let content = br#"{"text":"hi"}"#;
        let mut expected = vec![content.len() as u8];
        expected.extend_from_slice(content);
        expected.push(0); // no unsigned content
        expected.push(0); // chat type
        expected.extend_from_slice(alex().as_bytes());
        let name = br#"{"text":"Alex"}"#;
        expected.push(name.len() as u8);
        expected.extend_from_slice(name);
        expected.push(0); // no team
        expected.extend_from_slice(&1i64.to_be_bytes());
        expected.extend_from_slice(&2i64.to_be_bytes());
        expected.extend_from_slice(&[4, 0xAB, 0xAB, 0xAB, 0xAB]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_1_19_1_last_seen_entries() {
        let mut chat = player_chat(V1_19_1, profile(), "hi", ChatTypeRef::Id(0));
        chat.previous_signature = Gated::Present(Some(vec![1; 8]));
        chat.formatted_content = Gated::Present(Some(TextComponent::plain("<Alex> hi")));
        chat.last_seen = Gated::Present(vec![LastSeenMessage::Entry {
            sender: alex(),
            signature: vec![2; 8],
        }]);
        chat.filter = Gated::Present(FilterMask::PartiallyFiltered(vec![0b101]));
        round_trip(&chat, V1_19_1);

        let mut writer = PacketWriter::new(V1_19_3);
        assert!(chat.write(&mut writer).is_err());
    }

    #[test]
    fn test_1_19_3_optional_signature() {
        let mut chat = player_chat(V1_19_3, profile(), "hi", ChatTypeRef::Id(0));
        let unsigned = encode(&chat, V1_19_3);
        if let Gated::Present(data) = &mut chat.sign_data {
            data.signature = Some(vec![7; SIGNATURE_LEN]);
        }
        chat.last_seen = Gated::Present(vec![LastSeenMessage::Cached(3)]);
        let signed = round_trip(&chat, V1_19_3);
        assert_eq!(signed.len(), unsigned.len() + SIGNATURE_LEN + 1);

        if let Gated::Present(data) = &mut chat.sign_data {
            data.signature = Some(vec![7; 12]);
        }
        let mut writer = PacketWriter::new(V1_19_3);
        assert!(chat.write(&mut writer).is_err());
    }

    #[test]
    fn test_chat_type_forms() {
        let chat = player_chat(V1_20_3, profile(), "hi", ChatTypeRef::Id(0));
        let old = encode(&chat, V1_20_3);
        let chat = player_chat(V1_20_5, profile(), "hi", ChatTypeRef::Id(0));
        let new = encode(&chat, V1_20_5);
        // Holder ids are shifted by one from 1.20.5. The chat type sits
        // before the sender name (a 7 byte NBT string) and the team flag.
        assert_eq!(old.len(), new.len());
        assert_eq!(old[old.len() - 9], 0);
        assert_eq!(new[new.len() - 9], 1);
    }

    #[test]
    fn test_negative_chat_type_holder_is_rejected() {
        let chat = player_chat(V1_20_5, profile(), "hi", ChatTypeRef::Id(0));
        let bytes = encode(&chat, V1_20_5);
        let holder = bytes.len() - 9;
        assert_eq!(bytes[holder], 1);

        // i32::MIN and -2 in place of the holder id.
        for wire in [&[0x80, 0x80, 0x80, 0x80, 0x08][..], &[0xFE, 0xFF, 0xFF, 0xFF, 0x0F][..]] {
            let mut hostile = bytes[..holder].to_vec();
            hostile.extend_from_slice(wire);
            hostile.extend_from_slice(&bytes[holder + 1..]);
            let mut reader = PacketReader::new(&hostile, V1_20_5);
            assert!(matches!(
                PlayerChatMessage::read(&mut reader),
                Err(CodecError::ValueOutOfRange {
                    what: "chat type id",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_missing_profile_is_rejected() {
        let chat = player_chat(V1_19_3, MessageSender::Uuid(alex()), "hi", ChatTypeRef::Id(0));
        let mut writer = PacketWriter::new(V1_19_3);
        assert!(matches!(
            chat.write(&mut writer),
            Err(CodecError::MissingField("sender_name"))
        ));

        let chat = player_chat(V1_16, profile(), "hi", ChatTypeRef::Id(0));
        let mut writer = PacketWriter::new(V1_16);
        assert!(matches!(
            chat.write(&mut writer),
            Err(CodecError::FieldNotInVersion {
                field: "sender_name",
                ..
            })
        ));
    }

    #[test]
    fn test_serverbound_chat_brackets() {
        let legacy = ServerboundChatMessage {
            message: "hello".into(),
            ..ServerboundChatMessage::default()
        };
        assert_eq!(round_trip(&legacy, V1_8), b"\x05hello".to_vec());
        let long = ServerboundChatMessage {
            message: "x".repeat(200),
            ..ServerboundChatMessage::default()
        };
        round_trip(&long, V1_11);
        let mut writer = PacketWriter::new(V1_10);
        assert!(long.write(&mut writer).is_err());

        let signed = ServerboundChatMessage {
            message: "hello".into(),
            sign_data: Gated::Present(MessageSignData {
                timestamp: 10,
                salt: 20,
                signature: Some(vec![1, 2, 3]),
            }),
            signed_preview: Gated::Present(false),
            ..ServerboundChatMessage::default()
        };
        assert_eq!(round_trip(&signed, V1_19).len(), 6 + 16 + 4 + 1);

        let acknowledging = ServerboundChatMessage {
            last_seen: Gated::Present(vec![LastSeenMessage::Entry {
                sender: alex(),
                signature: vec![5; 4],
            }]),
            last_received: Gated::Present(None),
            ..signed.clone()
        };
        round_trip(&acknowledging, V1_19_1);

        let packed = ServerboundChatMessage {
            message: "hello".into(),
            sign_data: Gated::Present(MessageSignData {
                timestamp: 10,
                salt: 20,
                signature: None,
            }),
            message_count: Gated::Present(2),
            acknowledged: Gated::Present(vec![0b11, 0, 0]),
            ..ServerboundChatMessage::default()
        };
        assert_eq!(round_trip(&packed, V1_19_3).len(), 6 + 16 + 1 + 1 + 3);
        assert_eq!(round_trip(&packed, ProtocolVersion::NEWEST).len(), 6 + 16 + 1 + 1 + 3);
    }

    #[test]
    fn test_system_chat_brackets() {
        let typed = SystemChat {
            content: TextComponent::plain("Server restarting"),
            kind: Gated::Present(1),
            overlay: Gated::Absent,
        };
        round_trip(&typed, V1_19);
        let overlay = SystemChat {
            kind: Gated::Absent,
            overlay: Gated::Present(true),
            ..typed.clone()
        };
        round_trip(&overlay, V1_19_1);
        round_trip(&overlay, V1_21);
        let mut writer = PacketWriter::new(V1_19_1);
        assert!(typed.write(&mut writer).is_err());
    }
}
