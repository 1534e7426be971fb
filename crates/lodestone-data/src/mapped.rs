//! Registries whose numeric ids shift between protocol versions.

use crate::{DataError, RawEntry, RawRegistry};
use lodestone_types::{BracketIndex, Identifier, ProtocolVersion, VersionBrackets};
use std::collections::HashMap;

/// A logical registry entry and the ids it carries across versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedEntity {
    pub name: Identifier,
    pub brackets: VersionBrackets<i32>,
}

impl MappedEntity {
    /// The id in `version`, or `None` when the entry does not exist there.
    pub fn id(&self, version: ProtocolVersion) -> Option<i32> {
        self.brackets.get(version).copied()
    }
}

#[derive(Debug, Clone)]
pub struct MappedRegistry {
    name: &'static str,
    entities: Vec<MappedEntity>,
    by_name: HashMap<Identifier, usize>,
    by_id: BracketIndex<i32, usize>,
}

impl MappedRegistry {
    pub(crate) fn from_raw(raw: &RawRegistry) -> Result<Self, DataError> {
        let entities = raw
            .entries
            .iter()
            .map(|entry| resolve_entry(raw.name, entry))
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_name = HashMap::with_capacity(entities.len());
        for (idx, entity) in entities.iter().enumerate() {
            if by_name.insert(entity.name.clone(), idx).is_some() {
                return Err(DataError::DuplicateName {
                    registry: raw.name,
                    name: entity.name.to_string(),
                });
            }
        }

        let by_id = BracketIndex::build(
            entities
                .iter()
                .enumerate()
                .map(|(idx, entity)| (&entity.brackets, idx)),
        )
        .map_err(|collision| DataError::DuplicateId {
            registry: raw.name,
            version: collision.version,
            id: collision.key,
            existing: entities[collision.existing].name.to_string(),
            incoming: entities[collision.incoming].name.to_string(),
        })?;

        Ok(Self {
            name: raw.name,
            entities,
            by_name,
            by_id,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get_by_id(&self, version: ProtocolVersion, id: i32) -> Option<&MappedEntity> {
        self.by_id.get(version, id).map(|idx| &self.entities[idx])
    }

    pub fn get_id(&self, version: ProtocolVersion, name: &Identifier) -> Option<i32> {
        self.get(name)?.id(version)
    }

    pub fn get(&self, name: &Identifier) -> Option<&MappedEntity> {
        self.by_name.get(name).map(|&idx| &self.entities[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappedEntity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn resolve_entry(registry: &'static str, entry: &RawEntry) -> Result<MappedEntity, DataError> {
    let name = Identifier::parse(entry.name).map_err(|_| DataError::InvalidName {
        registry,
        name: entry.name,
    })?;
    let starts = entry
        .brackets
        .iter()
        .map(|&(protocol, id)| {
            ProtocolVersion::from_protocol(protocol)
                .map(|version| (version, id))
                .ok_or(DataError::UnknownVersion {
                    registry,
                    name: entry.name,
                    protocol,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let brackets = VersionBrackets::new(starts).map_err(|source| DataError::Bracket {
        registry,
        name: entry.name,
        source,
    })?;
    Ok(MappedEntity { name, brackets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProtocolVersion::*;

    static RAW: RawRegistry = RawRegistry {
        name: "test",
        entries: &[
            RawEntry {
                name: "minecraft:a",
                brackets: &[(47, Some(0)), (393, Some(1))],
            },
            RawEntry {
                name: "minecraft:b",
                brackets: &[(47, Some(1)), (393, Some(0)), (759, None)],
            },
            RawEntry {
                name: "minecraft:c",
                brackets: &[(766, Some(0))],
            },
        ],
    };

    #[test]
    fn test_forward_and_reverse() {
        let registry = MappedRegistry::from_raw(&RAW).unwrap();
        let a = Identifier::minecraft("a");
        let b = Identifier::minecraft("b");
        assert_eq!(registry.get_id(V1_8, &a), Some(0));
        assert_eq!(registry.get_id(V1_13, &a), Some(1));
        assert_eq!(registry.get_id(V1_19, &b), None);
        assert_eq!(registry.get_by_id(V1_12_2, 1).unwrap().name, b);
        assert_eq!(registry.get_by_id(V1_13, 1).unwrap().name, a);
        assert_eq!(registry.get_by_id(V1_19, 0), None);
        assert_eq!(
            registry.get_by_id(V1_20_5, 0).unwrap().name,
            Identifier::minecraft("c")
        );
    }

    #[test]
    fn test_collision_detected() {
        static BAD: RawRegistry = RawRegistry {
            name: "bad",
            entries: &[
                RawEntry {
                    name: "minecraft:a",
                    brackets: &[(47, Some(3))],
                },
                RawEntry {
                    name: "minecraft:b",
                    brackets: &[(47, Some(2)), (107, Some(3))],
                },
            ],
        };
        let err = MappedRegistry::from_raw(&BAD).unwrap_err();
        assert!(matches!(err, DataError::DuplicateId { id: 3, version: V1_9, .. }));
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        static BAD: RawRegistry = RawRegistry {
            name: "bad",
            entries: &[RawEntry {
                name: "minecraft:a",
                brackets: &[(48, Some(0))],
            }],
        };
        assert!(matches!(
            MappedRegistry::from_raw(&BAD),
            Err(DataError::UnknownVersion { protocol: 48, .. })
        ));
    }
}
