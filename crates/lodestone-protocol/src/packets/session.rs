use crate::item::{read_slot, write_slot, ItemStack};
use lodestone_protocol_core::text::{read_text, write_text};
use lodestone_protocol_core::{
    CodecError, CodecResult, Field, Gated, Layout, PacketData, PacketIdentity, PacketReader,
    PacketWriter,
};
use lodestone_types::{BlockPos, TextComponent, VersionRange};

use lodestone_types::ProtocolVersion::*;

fn read_keep_alive_varint(reader: &mut PacketReader<'_>) -> CodecResult<i64> {
    Ok(reader.read_varint()? as i64)
}

/// Before 1.12.2 the id is a VarInt, so it must fit in 32 bits.
fn write_keep_alive_varint(writer: &mut PacketWriter, id: i64) -> CodecResult<()> {
    let id = i32::try_from(id).map_err(|_| CodecError::ValueOutOfRange {
        what: "keep alive id",
        value: id,
    })?;
    writer.write_varint(id);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerboundKeepAlive {
    pub id: i64,
}

pub(crate) static SERVERBOUND_KEEP_ALIVE: Layout<ServerboundKeepAlive> = Layout::new(
    "serverbound_keep_alive",
    &[
        Field::new(
            "id",
            VersionRange::until(V1_12_2),
            |r, p| {
                p.id = read_keep_alive_varint(r)?;
                Ok(())
            },
            |w, p| write_keep_alive_varint(w, p.id),
        ),
        Field::new(
            "id",
            VersionRange::since(V1_12_2),
            |r, p| {
                p.id = r.read_i64()?;
                Ok(())
            },
            |w, p| {
                w.write_i64(p.id);
                Ok(())
            },
        ),
    ],
);

layout_packet!(ServerboundKeepAlive, SERVERBOUND_KEEP_ALIVE);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientboundKeepAlive {
    pub id: i64,
}

pub(crate) static CLIENTBOUND_KEEP_ALIVE: Layout<ClientboundKeepAlive> = Layout::new(
    "clientbound_keep_alive",
    &[
        Field::new(
            "id",
            VersionRange::until(V1_12_2),
            |r, p| {
                p.id = read_keep_alive_varint(r)?;
                Ok(())
            },
            |w, p| write_keep_alive_varint(w, p.id),
        ),
        Field::new(
            "id",
            VersionRange::since(V1_12_2),
            |r, p| {
                p.id = r.read_i64()?;
                Ok(())
            },
            |w, p| {
                w.write_i64(p.id);
                Ok(())
            },
        ),
    ],
);

layout_packet!(ClientboundKeepAlive, CLIENTBOUND_KEEP_ALIVE);

/// Tab completion request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandSuggestionsRequest {
    /// 1.13+.
    pub transaction_id: Gated<i32>,
    pub text: String,
    /// 1.9 to 1.12.2.
    pub assume_command: Gated<bool>,
    /// Before 1.13: the block the player is looking at, if any.
    pub looked_at: Gated<Option<BlockPos>>,
}

pub(crate) static COMMAND_SUGGESTIONS_REQUEST: Layout<CommandSuggestionsRequest> = Layout::new(
    "command_suggestions_request",
    &[
        Field::gated(
            "transaction_id",
            VersionRange::since(V1_13),
            |r, p| {
                p.transaction_id = Gated::Present(r.read_varint()?);
                Ok(())
            },
            |w, p| {
                w.write_varint(*p.transaction_id.require("transaction_id")?);
                Ok(())
            },
            |p| p.transaction_id.is_present(),
        ),
        Field::new(
            "text",
            VersionRange::until(V1_13),
            |r, p| {
                p.text = r.read_string(32767)?;
                Ok(())
            },
            |w, p| w.write_string(&p.text, 32767),
        ),
        Field::new(
            "text",
            VersionRange::since(V1_13),
            |r, p| {
                p.text = r.read_string(32500)?;
                Ok(())
            },
            |w, p| w.write_string(&p.text, 32500),
        ),
        Field::gated(
            "assume_command",
            VersionRange::between(V1_9, V1_13),
            |r, p| {
                p.assume_command = Gated::Present(r.read_bool()?);
                Ok(())
            },
            |w, p| {
                w.write_bool(*p.assume_command.require("assume_command")?);
                Ok(())
            },
            |p| p.assume_command.is_present(),
        ),
        Field::gated(
            "looked_at",
            VersionRange::until(V1_13),
            |r, p| {
                p.looked_at = Gated::Present(r.read_optional(|r| r.read_position())?);
                Ok(())
            },
            |w, p| {
                let pos = p.looked_at.require("looked_at")?;
                w.write_optional(pos.as_ref(), |w, pos| {
                    w.write_position(pos);
                    Ok(())
                })
            },
            |p| p.looked_at.is_present(),
        ),
    ],
);

layout_packet!(CommandSuggestionsRequest, COMMAND_SUGGESTIONS_REQUEST);

/// Creative-mode inventory edit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetCreativeModeSlot {
    pub slot: i16,
    pub item: Option<ItemStack>,
}

impl PacketData for SetCreativeModeSlot {
    const IDENTITY: PacketIdentity = PacketIdentity::SetCreativeModeSlot;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            slot: reader.read_i16()?,
            item: read_slot(reader)?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_i16(self.slot);
        write_slot(writer, self.item.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetContainerSlot {
    /// A byte before 1.21.2, a VarInt after.
    pub window_id: i32,
    /// 1.17.1+.
    pub state_id: Gated<i32>,
    pub slot: i16,
    pub item: Option<ItemStack>,
}

pub(crate) static SET_CONTAINER_SLOT: Layout<SetContainerSlot> = Layout::new(
    "set_container_slot",
    &[
        Field::new(
            "window_id",
            VersionRange::until(V1_21_2),
            |r, p| {
                p.window_id = r.read_i8()? as i32;
                Ok(())
            },
            |w, p| {
                let id = i8::try_from(p.window_id).map_err(|_| CodecError::ValueOutOfRange {
                    what: "window id",
                    value: p.window_id as i64,
                })?;
                w.write_i8(id);
                Ok(())
            },
        ),
        Field::new(
            "window_id",
            VersionRange::since(V1_21_2),
            |r, p| {
                p.window_id = r.read_varint()?;
                Ok(())
            },
            |w, p| {
                w.write_varint(p.window_id);
                Ok(())
            },
        ),
        Field::gated(
            "state_id",
            VersionRange::since(V1_17_1),
            |r, p| {
                p.state_id = Gated::Present(r.read_varint()?);
                Ok(())
            },
            |w, p| {
                w.write_varint(*p.state_id.require("state_id")?);
                Ok(())
            },
            |p| p.state_id.is_present(),
        ),
        Field::new(
            "slot",
            VersionRange::ALL,
            |r, p| {
                p.slot = r.read_i16()?;
                p.item = read_slot(r)?;
                Ok(())
            },
            |w, p| {
                w.write_i16(p.slot);
                write_slot(w, p.item.as_ref())
            },
        ),
    ],
);

layout_packet!(SetContainerSlot, SET_CONTAINER_SLOT);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Disconnect {
    pub reason: TextComponent,
}

impl PacketData for Disconnect {
    const IDENTITY: PacketIdentity = PacketIdentity::Disconnect;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            reason: read_text(reader)?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        write_text(writer, &self.reason)
    }
}

empty_packets!(ConfigurationAcknowledged, StartConfiguration);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::testing::{encode, round_trip};

    #[test]
    fn test_keep_alive_width() {
        assert_eq!(round_trip(&ServerboundKeepAlive { id: 5 }, V1_12_1), vec![5]);
        assert_eq!(round_trip(&ServerboundKeepAlive { id: 5 }, V1_12_2).len(), 8);
        assert_eq!(round_trip(&ClientboundKeepAlive { id: 300 }, V1_8), vec![0xAC, 0x02]);

        let mut writer = PacketWriter::new(V1_8);
        assert!(matches!(
            ClientboundKeepAlive { id: i64::MAX }.write(&mut writer),
            Err(CodecError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_tab_complete_brackets() {
        let legacy = CommandSuggestionsRequest {
            text: "/tp ".into(),
            looked_at: Gated::Present(Some(BlockPos::new(10, 64, -10))),
            ..CommandSuggestionsRequest::default()
        };
        assert_eq!(round_trip(&legacy, V1_8).len(), 5 + 1 + 8);

        let with_flag = CommandSuggestionsRequest {
            assume_command: Gated::Present(false),
            looked_at: Gated::Present(None),
            ..legacy.clone()
        };
        assert_eq!(round_trip(&with_flag, V1_12_2).len(), 5 + 1 + 1);

        let modern = CommandSuggestionsRequest {
            transaction_id: Gated::Present(7),
            text: "/tp ".into(),
            ..CommandSuggestionsRequest::default()
        };
        assert_eq!(round_trip(&modern, V1_13), vec![7, 4, b'/', b't', b'p', b' ']);

        let mut writer = PacketWriter::new(V1_13);
        assert!(matches!(
            with_flag.write(&mut writer),
            Err(CodecError::FieldNotInVersion { .. })
        ));
    }

    #[test]
    fn test_container_slot_brackets() {
        let legacy = SetContainerSlot {
            window_id: 0,
            slot: 36,
            item: Some(ItemStack::new(1, 64, V1_16)),
            ..SetContainerSlot::default()
        };
        round_trip(&legacy, V1_16);

        let stateful = SetContainerSlot {
            state_id: Gated::Present(3),
            item: Some(ItemStack::new(1, 64, V1_21)),
            ..legacy.clone()
        };
        round_trip(&stateful, V1_21);
        let wide = SetContainerSlot {
            window_id: 300,
            ..stateful.clone()
        };
        round_trip(&wide, V1_21_2);

        let mut writer = PacketWriter::new(V1_21);
        assert!(wide.write(&mut writer).is_err());
    }

    #[test]
    fn test_creative_slot_and_disconnect() {
        round_trip(
            &SetCreativeModeSlot {
                slot: 36,
                item: Some(ItemStack::new(276, 1, V1_8)),
            },
            V1_8,
        );
        round_trip(&SetCreativeModeSlot { slot: -1, item: None }, V1_21_4);

        let reason = TextComponent {
            color: Some("red".into()),
            ..TextComponent::plain("Kicked")
        };
        round_trip(&Disconnect { reason: reason.clone() }, V1_20_2);
        round_trip(&Disconnect { reason }, V1_21);
        assert!(encode(&StartConfiguration, V1_20_2).is_empty());
    }
}
