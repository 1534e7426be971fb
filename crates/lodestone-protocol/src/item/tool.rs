use lodestone_data::registries;
use lodestone_protocol_core::{CodecResult, MappedEntitySet, PacketReader, PacketWriter};
use lodestone_types::{Identifier, ProtocolVersion};

/// The `tool` component: per-block mining rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub rules: Vec<ToolRule>,
    pub default_mining_speed: f32,
    pub damage_per_block: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolRule {
    pub blocks: MappedEntitySet,
    pub speed: Option<f32>,
    pub correct_for_drops: Option<bool>,
}

impl ToolRule {
    /// A rule over named blocks, resolved to the ids of `version`.
    pub fn for_blocks(
        names: &[Identifier],
        version: ProtocolVersion,
        speed: Option<f32>,
        correct_for_drops: Option<bool>,
    ) -> CodecResult<Self> {
        let blocks = MappedEntitySet::from_names(&registries()?.block, version, names)?;
        Ok(Self {
            blocks,
            speed,
            correct_for_drops,
        })
    }

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        let blocks = MappedEntitySet::read(reader)?;
        let speed = reader.read_optional(|r| r.read_f32())?;
        let correct_for_drops = reader.read_optional(|r| r.read_bool())?;
        Ok(Self {
            blocks,
            speed,
            correct_for_drops,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        self.blocks.write(writer)?;
        writer.write_optional(self.speed.as_ref(), |w, speed| {
            w.write_f32(*speed);
            Ok(())
        })?;
        writer.write_optional(self.correct_for_drops.as_ref(), |w, correct| {
            w.write_bool(*correct);
            Ok(())
        })
    }
}

impl Tool {
    pub(crate) fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        let rules = reader.read_list(ToolRule::read)?;
        let default_mining_speed = reader.read_f32()?;
        let damage_per_block = reader.read_varint()?;
        Ok(Self {
            rules,
            default_mining_speed,
            damage_per_block,
        })
    }

    pub(crate) fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_list(&self.rules, |w, rule| rule.write(w))?;
        writer.write_f32(self.default_mining_speed);
        writer.write_varint(self.damage_per_block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_protocol_core::CodecError;

    #[test]
    fn test_rule_resolves_block_ids() {
        let names = [
            Identifier::minecraft("stone"),
            Identifier::minecraft("granite"),
            Identifier::minecraft("polished_granite"),
        ];
        let rule = ToolRule::for_blocks(&names, ProtocolVersion::V1_21, Some(4.0), Some(true)).unwrap();
        assert_eq!(rule.blocks.ids(), Some(vec![1, 2, 3]));

        let tool = Tool {
            rules: vec![rule],
            default_mining_speed: 1.0,
            damage_per_block: 1,
        };
        let mut writer = PacketWriter::new(ProtocolVersion::V1_21);
        tool.write(&mut writer).unwrap();
        let bytes = writer.into_inner();
        let mut reader = PacketReader::new(&bytes, ProtocolVersion::V1_21);
        assert_eq!(Tool::read(&mut reader).unwrap(), tool);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_rule_rejects_blocks_missing_from_version() {
        let err = ToolRule::for_blocks(
            &[Identifier::minecraft("granite")],
            ProtocolVersion::V1_12_2,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::UnmappedEntity { .. }));
    }
}
