pub mod mapped;

pub use mapped::{MappedEntity, MappedRegistry};

use lodestone_types::{BracketError, ProtocolVersion};
use once_cell::sync::OnceCell;
use thiserror::Error;

/// One registry as emitted by the build script.
#[derive(Debug)]
pub struct RawRegistry {
    pub name: &'static str,
    pub entries: &'static [RawEntry],
}

/// `(since protocol, id)` pairs for one entry. `None` marks removal.
#[derive(Debug)]
pub struct RawEntry {
    pub name: &'static str,
    pub brackets: &'static [(i32, Option<i32>)],
}

include!(concat!(env!("OUT_DIR"), "/generated.rs"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("{registry}: invalid entry name {name:?}")]
    InvalidName {
        registry: &'static str,
        name: &'static str,
    },
    #[error("{registry}: {name} names unknown protocol {protocol}")]
    UnknownVersion {
        registry: &'static str,
        name: &'static str,
        protocol: i32,
    },
    #[error("{registry}: {name}: {source}")]
    Bracket {
        registry: &'static str,
        name: &'static str,
        source: BracketError,
    },
    #[error("{registry}: {name} declared twice")]
    DuplicateName {
        registry: &'static str,
        name: String,
    },
    #[error("{registry}: id {id} in {version} claimed by both {existing} and {incoming}")]
    DuplicateId {
        registry: &'static str,
        version: ProtocolVersion,
        id: i32,
        existing: String,
        incoming: String,
    },
    #[error("registry {0} missing from the data tables")]
    MissingRegistry(&'static str),
}

/// The mapped registries the codec consults.
#[derive(Debug, Clone)]
pub struct Registries {
    pub chat_type: MappedRegistry,
    pub data_component_type: MappedRegistry,
    pub block: MappedRegistry,
    pub item: MappedRegistry,
}

impl Registries {
    pub fn build() -> Result<Self, DataError> {
        let load = |name: &'static str| -> Result<MappedRegistry, DataError> {
            let raw = RAW_REGISTRIES
                .iter()
                .find(|raw| raw.name == name)
                .ok_or(DataError::MissingRegistry(name))?;
            let registry = MappedRegistry::from_raw(raw)?;
            tracing::debug!("Loaded registry {} ({} entries)", name, registry.len());
            Ok(registry)
        };
        Ok(Self {
            chat_type: load("chat_type")?,
            data_component_type: load("data_component_type")?,
            block: load("block")?,
            item: load("item")?,
        })
    }

    pub fn get(&self, name: &str) -> Option<&MappedRegistry> {
        match name {
            "chat_type" => Some(&self.chat_type),
            "data_component_type" => Some(&self.data_component_type),
            "block" => Some(&self.block),
            "item" => Some(&self.item),
            _ => None,
        }
    }
}

static REGISTRIES: OnceCell<Registries> = OnceCell::new();

/// The process-wide registries, built on first use.
pub fn registries() -> Result<&'static Registries, DataError> {
    REGISTRIES.get_or_try_init(Registries::build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_types::Identifier;
    use ProtocolVersion::*;

    #[test]
    fn test_shipped_tables_build() {
        let registries = registries().unwrap();
        for name in ["chat_type", "data_component_type", "block", "item"] {
            assert!(!registries.get(name).unwrap().is_empty(), "{}", name);
        }
    }

    #[test]
    fn test_chat_type_brackets() {
        let chat_types = &registries().unwrap().chat_type;
        let say = Identifier::minecraft("say_command");
        assert_eq!(chat_types.get_id(V1_18_2, &say), None);
        assert_eq!(chat_types.get_id(V1_19, &say), Some(3));
        assert_eq!(chat_types.get_id(V1_19_1, &say), Some(1));
        assert_eq!(chat_types.get_id(V1_20_5, &say), Some(4));
        assert_eq!(
            chat_types.get_by_id(V1_8, 1).unwrap().name,
            Identifier::minecraft("system")
        );
    }

    #[test]
    fn test_component_removed_in_later_version() {
        let components = &registries().unwrap().data_component_type;
        let fire = Identifier::minecraft("fire_resistant");
        assert_eq!(components.get_id(V1_20_3, &fire), None);
        assert_eq!(components.get_id(V1_21, &fire), Some(21));
        assert_eq!(components.get_id(V1_21_4, &fire), None);
    }

    #[test]
    fn test_every_id_resolves_back() {
        let registries = registries().unwrap();
        for name in ["chat_type", "data_component_type", "block", "item"] {
            let registry = registries.get(name).unwrap();
            for &version in ProtocolVersion::ALL {
                for entity in registry.iter() {
                    if let Some(id) = entity.id(version) {
                        assert_eq!(
                            registry.get_by_id(version, id).map(|e| &e.name),
                            Some(&entity.name),
                            "{} {} in {}",
                            name,
                            entity.name,
                            version
                        );
                    }
                }
            }
        }
    }
}
