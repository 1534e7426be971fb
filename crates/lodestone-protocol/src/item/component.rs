//! Data components (1.20.5+), the typed replacement for item NBT.

use super::tool::Tool;
use super::{read_slot_nested, write_slot, ItemStack};
use indexmap::{IndexMap, IndexSet};
use lodestone_data::registries;
use lodestone_nbt::NbtValue;
use lodestone_protocol_core::text::{read_text, write_text};
use lodestone_protocol_core::{CodecError, CodecResult, PacketReader, PacketWriter};
use lodestone_types::{Identifier, ProtocolVersion, TextComponent};

pub const MAX_LORE_LINES: usize = 256;
pub const MAX_CONTAINER_SLOTS: usize = 256;
const MAX_STACK_SIZE_LIMIT: i32 = 99;

macro_rules! component_types {
    ($($variant:ident => $name:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ComponentType {
            $($variant,)*
        }

        impl ComponentType {
            pub const ALL: &'static [ComponentType] = &[$(ComponentType::$variant,)*];

            pub const fn name(self) -> &'static str {
                match self {
                    $(ComponentType::$variant => $name,)*
                }
            }
        }
    };
}

component_types! {
    CustomData => "custom_data",
    MaxStackSize => "max_stack_size",
    MaxDamage => "max_damage",
    Damage => "damage",
    Unbreakable => "unbreakable",
    CustomName => "custom_name",
    ItemName => "item_name",
    Lore => "lore",
    Rarity => "rarity",
    RepairCost => "repair_cost",
    CreativeSlotLock => "creative_slot_lock",
    EnchantmentGlintOverride => "enchantment_glint_override",
    FireResistant => "fire_resistant",
    HideTooltip => "hide_tooltip",
    HideAdditionalTooltip => "hide_additional_tooltip",
    Tool => "tool",
    Container => "container",
}

impl ComponentType {
    pub fn identifier(self) -> Identifier {
        Identifier::minecraft(self.name())
    }

    /// The wire id in `version`.
    pub fn id(self, version: ProtocolVersion) -> CodecResult<i32> {
        let registry = &registries()?.data_component_type;
        registry
            .get_id(version, &self.identifier())
            .ok_or_else(|| CodecError::UnmappedEntity {
                registry: registry.name(),
                name: self.identifier().to_string(),
                version,
            })
    }

    /// Component payloads have no length prefix, so an id we cannot decode
    /// ends the stream.
    pub fn from_id(id: i32, version: ProtocolVersion) -> CodecResult<Self> {
        let entity = registries()?
            .data_component_type
            .get_by_id(version, id)
            .ok_or(CodecError::UnknownComponentType(id))?;
        Self::ALL
            .iter()
            .copied()
            .find(|ty| entity.name.namespace == "minecraft" && entity.name.path == ty.name())
            .ok_or(CodecError::UnknownComponentType(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
}

impl Rarity {
    fn from_wire(value: i32) -> CodecResult<Self> {
        match value {
            0 => Ok(Rarity::Common),
            1 => Ok(Rarity::Uncommon),
            2 => Ok(Rarity::Rare),
            3 => Ok(Rarity::Epic),
            _ => Err(CodecError::InvalidEnum {
                what: "rarity",
                value,
            }),
        }
    }

    fn to_wire(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    CustomData(NbtValue),
    MaxStackSize(i32),
    MaxDamage(i32),
    Damage(i32),
    Unbreakable { show_in_tooltip: bool },
    CustomName(TextComponent),
    ItemName(TextComponent),
    Lore(Vec<TextComponent>),
    Rarity(Rarity),
    RepairCost(i32),
    CreativeSlotLock,
    EnchantmentGlintOverride(bool),
    FireResistant,
    HideTooltip,
    HideAdditionalTooltip,
    Tool(Tool),
    Container(Vec<Option<ItemStack>>),
}

fn check_stack_size(size: i32) -> CodecResult<i32> {
    if (1..=MAX_STACK_SIZE_LIMIT).contains(&size) {
        Ok(size)
    } else {
        Err(CodecError::ValueOutOfRange {
            what: "max stack size",
            value: size as i64,
        })
    }
}

impl ComponentValue {
    pub fn component_type(&self) -> ComponentType {
        match self {
            ComponentValue::CustomData(_) => ComponentType::CustomData,
            ComponentValue::MaxStackSize(_) => ComponentType::MaxStackSize,
            ComponentValue::MaxDamage(_) => ComponentType::MaxDamage,
            ComponentValue::Damage(_) => ComponentType::Damage,
            ComponentValue::Unbreakable { .. } => ComponentType::Unbreakable,
            ComponentValue::CustomName(_) => ComponentType::CustomName,
            ComponentValue::ItemName(_) => ComponentType::ItemName,
            ComponentValue::Lore(_) => ComponentType::Lore,
            ComponentValue::Rarity(_) => ComponentType::Rarity,
            ComponentValue::RepairCost(_) => ComponentType::RepairCost,
            ComponentValue::CreativeSlotLock => ComponentType::CreativeSlotLock,
            ComponentValue::EnchantmentGlintOverride(_) => ComponentType::EnchantmentGlintOverride,
            ComponentValue::FireResistant => ComponentType::FireResistant,
            ComponentValue::HideTooltip => ComponentType::HideTooltip,
            ComponentValue::HideAdditionalTooltip => ComponentType::HideAdditionalTooltip,
            ComponentValue::Tool(_) => ComponentType::Tool,
            ComponentValue::Container(_) => ComponentType::Container,
        }
    }

    pub(crate) fn read(
        ty: ComponentType,
        reader: &mut PacketReader<'_>,
        depth: usize,
    ) -> CodecResult<Self> {
        Ok(match ty {
            ComponentType::CustomData => {
                ComponentValue::CustomData(reader.read_nbt_required("custom_data")?)
            }
            ComponentType::MaxStackSize => {
                ComponentValue::MaxStackSize(check_stack_size(reader.read_varint()?)?)
            }
            ComponentType::MaxDamage => ComponentValue::MaxDamage(reader.read_varint()?),
            ComponentType::Damage => ComponentValue::Damage(reader.read_varint()?),
            ComponentType::Unbreakable => ComponentValue::Unbreakable {
                show_in_tooltip: reader.read_bool()?,
            },
            ComponentType::CustomName => ComponentValue::CustomName(read_text(reader)?),
            ComponentType::ItemName => ComponentValue::ItemName(read_text(reader)?),
            ComponentType::Lore => ComponentValue::Lore(reader.read_list_max(MAX_LORE_LINES, read_text)?),
            ComponentType::Rarity => ComponentValue::Rarity(Rarity::from_wire(reader.read_varint()?)?),
            ComponentType::RepairCost => ComponentValue::RepairCost(reader.read_varint()?),
            ComponentType::CreativeSlotLock => ComponentValue::CreativeSlotLock,
            ComponentType::EnchantmentGlintOverride => {
                ComponentValue::EnchantmentGlintOverride(reader.read_bool()?)
            }
            ComponentType::FireResistant => ComponentValue::FireResistant,
            ComponentType::HideTooltip => ComponentValue::HideTooltip,
            ComponentType::HideAdditionalTooltip => ComponentValue::HideAdditionalTooltip,
            ComponentType::Tool => ComponentValue::Tool(Tool::read(reader)?),
            ComponentType::Container => ComponentValue::Container(
                reader.read_list_max(MAX_CONTAINER_SLOTS, |r| read_slot_nested(r, depth + 1))?,
            ),
        })
    }

    pub(crate) fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        match self {
            ComponentValue::CustomData(nbt) => writer.write_nbt(Some(nbt))?,
            ComponentValue::MaxStackSize(size) => writer.write_varint(check_stack_size(*size)?),
            ComponentValue::MaxDamage(value)
            | ComponentValue::Damage(value)
            | ComponentValue::RepairCost(value) => writer.write_varint(*value),
            ComponentValue::Unbreakable { show_in_tooltip } => writer.write_bool(*show_in_tooltip),
            ComponentValue::CustomName(text) | ComponentValue::ItemName(text) => {
                write_text(writer, text)?
            }
            ComponentValue::Lore(lines) => {
                if lines.len() > MAX_LORE_LINES {
                    return Err(CodecError::ValueOutOfRange {
                        what: "lore lines",
                        value: lines.len() as i64,
                    });
                }
                writer.write_list(lines, write_text)?
            }
            ComponentValue::Rarity(rarity) => writer.write_varint(rarity.to_wire()),
            ComponentValue::EnchantmentGlintOverride(glint) => writer.write_bool(*glint),
            ComponentValue::CreativeSlotLock
            | ComponentValue::FireResistant
            | ComponentValue::HideTooltip
            | ComponentValue::HideAdditionalTooltip => {}
            ComponentValue::Tool(tool) => tool.write(writer)?,
            ComponentValue::Container(slots) => {
                if slots.len() > MAX_CONTAINER_SLOTS {
                    return Err(CodecError::ValueOutOfRange {
                        what: "container slots",
                        value: slots.len() as i64,
                    });
                }
                writer.write_list(slots, |w, slot| write_slot(w, slot.as_ref()))?
            }
        }
        Ok(())
    }
}

/// Components added to and removed from an item's defaults.
///
/// Equality ignores the order components were listed in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentPatch {
    pub added: IndexMap<ComponentType, ComponentValue>,
    pub removed: IndexSet<ComponentType>,
}

impl ComponentPatch {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Add `value`, replacing any value of the same type.
    pub fn set(&mut self, value: ComponentValue) -> Option<ComponentValue> {
        let ty = value.component_type();
        self.removed.shift_remove(&ty);
        self.added.insert(ty, value)
    }

    pub fn remove(&mut self, ty: ComponentType) {
        self.added.shift_remove(&ty);
        self.removed.insert(ty);
    }

    pub fn get(&self, ty: ComponentType) -> Option<&ComponentValue> {
        self.added.get(&ty)
    }

    pub fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Self::read_nested(reader, 0)
    }

    pub(crate) fn read_nested(reader: &mut PacketReader<'_>, depth: usize) -> CodecResult<Self> {
        let version = reader.version();
        let added_count = reader.read_list_len()?;
        let removed_count = reader.read_list_len()?;

        let mut patch = ComponentPatch::default();
        for _ in 0..added_count {
            let id = reader.read_varint()?;
            let ty = ComponentType::from_id(id, version)?;
            let value = ComponentValue::read(ty, reader, depth)?;
            if patch.added.insert(ty, value).is_some() {
                return Err(CodecError::InvalidEnum {
                    what: "duplicate component",
                    value: id,
                });
            }
        }
        for _ in 0..removed_count {
            let id = reader.read_varint()?;
            let ty = ComponentType::from_id(id, version)?;
            if !patch.removed.insert(ty) {
                return Err(CodecError::InvalidEnum {
                    what: "duplicate component",
                    value: id,
                });
            }
        }
        Ok(patch)
    }

    pub fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        let version = writer.version();
        writer.write_varint(self.added.len() as i32);
        writer.write_varint(self.removed.len() as i32);
        for value in self.added.values() {
            writer.write_varint(value.component_type().id(version)?);
            value.write(writer)?;
        }
        for ty in &self.removed {
            writer.write_varint(ty.id(version)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_nbt::nbt_compound;
    use ProtocolVersion::*;

    fn encode(patch: &ComponentPatch, version: ProtocolVersion) -> Vec<u8> {
        let mut writer = PacketWriter::new(version);
        patch.write(&mut writer).unwrap();
        writer.into_inner().to_vec()
    }

    fn decode(bytes: &[u8], version: ProtocolVersion) -> ComponentPatch {
        let mut reader = PacketReader::new(bytes, version);
        let patch = ComponentPatch::read(&mut reader).unwrap();
        assert!(reader.is_empty());
        patch
    }

    fn sample() -> ComponentPatch {
        let mut patch = ComponentPatch::default();
        patch.set(ComponentValue::CustomName(TextComponent::plain("Excalibur")));
        patch.set(ComponentValue::Lore(vec![
            TextComponent::plain("first"),
            TextComponent::plain("second"),
        ]));
        patch.set(ComponentValue::Rarity(Rarity::Epic));
        patch.set(ComponentValue::CustomData(nbt_compound! {
            "owner" => NbtValue::String("steve".into()),
        }));
        patch.set(ComponentValue::Unbreakable {
            show_in_tooltip: false,
        });
        patch.set(ComponentValue::CreativeSlotLock);
        patch.remove(ComponentType::RepairCost);
        patch
    }

    #[test]
    fn test_ids_shift_between_versions() {
        assert_eq!(ComponentType::Lore.id(V1_20_5).unwrap(), 7);
        assert_eq!(ComponentType::Lore.id(V1_21_2).unwrap(), 8);
        assert_eq!(ComponentType::Container.id(V1_21).unwrap(), 52);
        assert!(matches!(
            ComponentType::FireResistant.id(V1_21_2),
            Err(CodecError::UnmappedEntity { .. })
        ));
        for &ty in ComponentType::ALL {
            let id = ComponentType::id(ty, V1_20_5).unwrap();
            assert_eq!(ComponentType::from_id(id, V1_20_5).unwrap(), ty);
        }
    }

    #[test]
    fn test_patch_survives_each_version() {
        let patch = sample();
        for version in [V1_20_5, V1_21, V1_21_2, V1_21_4] {
            let bytes = encode(&patch, version);
            assert_eq!(decode(&bytes, version), patch);
        }
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut a = ComponentPatch::default();
        a.set(ComponentValue::MaxDamage(250));
        a.set(ComponentValue::Damage(3));
        let mut b = ComponentPatch::default();
        b.set(ComponentValue::Damage(3));
        b.set(ComponentValue::MaxDamage(250));
        assert_eq!(a, b);
        assert_ne!(encode(&a, V1_21), encode(&b, V1_21));
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        // One added component of type 90, which no supported version defines.
        let bytes = [0x01, 0x00, 0x5A, 0x00];
        let mut reader = PacketReader::new(&bytes, V1_21);
        assert!(matches!(
            ComponentPatch::read(&mut reader),
            Err(CodecError::UnknownComponentType(90))
        ));
    }

    #[test]
    fn test_stack_size_bounds() {
        let mut patch = ComponentPatch::default();
        patch.set(ComponentValue::MaxStackSize(100));
        let mut writer = PacketWriter::new(V1_21);
        assert!(matches!(
            patch.write(&mut writer),
            Err(CodecError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_removed_in_later_version() {
        let mut patch = ComponentPatch::default();
        patch.set(ComponentValue::FireResistant);
        assert_eq!(decode(&encode(&patch, V1_21), V1_21), patch);
        let mut writer = PacketWriter::new(V1_21_2);
        assert!(patch.write(&mut writer).is_err());
    }
}
