//! Item stacks in every wire form from 1.8 on.
//!
//! - before 1.13: i16 id (`-1` for empty), i8 count, i16 damage, NBT
//! - 1.13 and 1.13.1: i16 id, i8 count, NBT
//! - 1.13.2 to 1.20.4: bool present, VarInt id, i8 count, NBT
//! - from 1.20.5: VarInt count (`0` for empty), VarInt id, component patch

pub mod component;
pub mod tool;

pub use component::{ComponentPatch, ComponentType, ComponentValue, Rarity};
pub use tool::{Tool, ToolRule};

use lodestone_data::registries;
use lodestone_nbt::NbtValue;
use lodestone_protocol_core::{CodecError, CodecResult, Gated, PacketReader, PacketWriter};
use lodestone_types::{Identifier, ProtocolVersion};

/// Containers can hold items that are containers themselves.
const MAX_NESTING: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub item: i32,
    pub count: i32,
    /// Before 1.13 only.
    pub damage: Gated<i16>,
    /// Before 1.20.5 only. `None` is the `TAG_END` marker.
    pub nbt: Gated<Option<NbtValue>>,
    /// From 1.20.5.
    pub components: Gated<ComponentPatch>,
}

impl ItemStack {
    /// A plain stack with the fields `version` carries.
    pub fn new(item: i32, count: i32, version: ProtocolVersion) -> Self {
        let legacy_damage = version < ProtocolVersion::V1_13;
        let components = version >= ProtocolVersion::V1_20_5;
        Self {
            item,
            count,
            damage: if legacy_damage {
                Gated::Present(0)
            } else {
                Gated::Absent
            },
            nbt: if components {
                Gated::Absent
            } else {
                Gated::Present(None)
            },
            components: if components {
                Gated::Present(ComponentPatch::default())
            } else {
                Gated::Absent
            },
        }
    }

    /// A plain stack of the item called `name`.
    pub fn named(name: &Identifier, count: i32, version: ProtocolVersion) -> CodecResult<Self> {
        let registry = &registries()?.item;
        let item = registry
            .get_id(version, name)
            .ok_or_else(|| CodecError::UnmappedEntity {
                registry: registry.name(),
                name: name.to_string(),
                version,
            })?;
        Ok(Self::new(item, count, version))
    }
}

pub fn read_slot(reader: &mut PacketReader<'_>) -> CodecResult<Option<ItemStack>> {
    read_slot_nested(reader, 0)
}

pub(crate) fn read_slot_nested(
    reader: &mut PacketReader<'_>,
    depth: usize,
) -> CodecResult<Option<ItemStack>> {
    if depth > MAX_NESTING {
        return Err(CodecError::ValueOutOfRange {
            what: "item nesting",
            value: depth as i64,
        });
    }

    let version = reader.version();
    if version >= ProtocolVersion::V1_20_5 {
        let count = reader.read_varint()?;
        if count == 0 {
            return Ok(None);
        }
        if count < 0 {
            return Err(CodecError::ValueOutOfRange {
                what: "item count",
                value: count as i64,
            });
        }
        let item = reader.read_varint()?;
        let components = ComponentPatch::read_nested(reader, depth)?;
        return Ok(Some(ItemStack {
            item,
            count,
            damage: Gated::Absent,
            nbt: Gated::Absent,
            components: Gated::Present(components),
        }));
    }

    let item = if version >= ProtocolVersion::V1_13_2 {
        if !reader.read_bool()? {
            return Ok(None);
        }
        reader.read_varint()?
    } else {
        match reader.read_i16()? {
            -1 => return Ok(None),
            id if id < 0 => {
                return Err(CodecError::ValueOutOfRange {
                    what: "item id",
                    value: id as i64,
                })
            }
            id => id as i32,
        }
    };
    let count = reader.read_i8()? as i32;
    let damage = if version < ProtocolVersion::V1_13 {
        Gated::Present(reader.read_i16()?)
    } else {
        Gated::Absent
    };
    let nbt = reader.read_nbt()?;
    Ok(Some(ItemStack {
        item,
        count,
        damage,
        nbt: Gated::Present(nbt),
        components: Gated::Absent,
    }))
}

pub fn write_slot(writer: &mut PacketWriter, slot: Option<&ItemStack>) -> CodecResult<()> {
    let version = writer.version();
    let components_era = version >= ProtocolVersion::V1_20_5;
    let damage_era = version < ProtocolVersion::V1_13;

    let Some(stack) = slot else {
        if components_era {
            writer.write_varint(0);
        } else if version >= ProtocolVersion::V1_13_2 {
            writer.write_bool(false);
        } else {
            writer.write_i16(-1);
        }
        return Ok(());
    };

    if stack.components.is_present() && !components_era {
        return Err(CodecError::FieldNotInVersion {
            field: "components",
            version,
        });
    }
    if stack.nbt.is_present() && components_era {
        return Err(CodecError::FieldNotInVersion {
            field: "nbt",
            version,
        });
    }
    if stack.damage.is_present() && !damage_era {
        return Err(CodecError::FieldNotInVersion {
            field: "damage",
            version,
        });
    }

    if components_era {
        if stack.count <= 0 {
            return Err(CodecError::ValueOutOfRange {
                what: "item count",
                value: stack.count as i64,
            });
        }
        writer.write_varint(stack.count);
        writer.write_varint(stack.item);
        return stack.components.require("components")?.write(writer);
    }

    let count = i8::try_from(stack.count).map_err(|_| CodecError::ValueOutOfRange {
        what: "item count",
        value: stack.count as i64,
    })?;
    if version >= ProtocolVersion::V1_13_2 {
        writer.write_bool(true);
        writer.write_varint(stack.item);
    } else {
        let id = i16::try_from(stack.item)
            .ok()
            .filter(|id| *id >= 0)
            .ok_or(CodecError::ValueOutOfRange {
                what: "item id",
                value: stack.item as i64,
            })?;
        writer.write_i16(id);
    }
    writer.write_i8(count);
    if damage_era {
        writer.write_i16(*stack.damage.require("damage")?);
    }
    writer.write_nbt(stack.nbt.require("nbt")?.as_ref())
}
