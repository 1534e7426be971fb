//! Declarative per-version field layouts.
//!
//! A layout is an ordered list of fields. Each field names the versions it
//! exists in and how to read and write it. Reading and writing walk the list
//! in order and skip fields outside the negotiated version. A field with
//! several encodings gets one entry per encoding under the same name.

use crate::buffer::{PacketReader, PacketWriter};
use crate::error::{CodecError, CodecResult};
use lodestone_types::{ProtocolVersion, VersionRange};
use std::collections::BTreeMap;
use thiserror::Error;

pub type ReadFn<T> = fn(&mut PacketReader<'_>, &mut T) -> CodecResult<()>;
pub type WriteFn<T> = fn(&mut PacketWriter, &T) -> CodecResult<()>;
pub type PresentFn<T> = fn(&T) -> bool;

pub struct Field<T: 'static> {
    pub name: &'static str,
    pub range: VersionRange,
    pub read: ReadFn<T>,
    pub write: WriteFn<T>,
    /// For version-gated fields: whether the value carries data for this
    /// field. Used to reject values that cannot be expressed in a version.
    pub present: Option<PresentFn<T>>,
}

impl<T> Field<T> {
    pub const fn new(
        name: &'static str,
        range: VersionRange,
        read: ReadFn<T>,
        write: WriteFn<T>,
    ) -> Self {
        Self {
            name,
            range,
            read,
            write,
            present: None,
        }
    }

    pub const fn gated(
        name: &'static str,
        range: VersionRange,
        read: ReadFn<T>,
        write: WriteFn<T>,
        present: PresentFn<T>,
    ) -> Self {
        Self {
            name,
            range,
            read,
            write,
            present: Some(present),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("{packet}.{field}: empty version range")]
    EmptyRange {
        packet: &'static str,
        field: &'static str,
    },
    #[error("{packet}.{field}: encodings overlap at {at}")]
    Overlap {
        packet: &'static str,
        field: &'static str,
        at: ProtocolVersion,
    },
    #[error("{packet}.{field}: encodings leave a gap before {at}")]
    Gap {
        packet: &'static str,
        field: &'static str,
        at: ProtocolVersion,
    },
}

pub struct Layout<T: 'static> {
    pub packet: &'static str,
    pub fields: &'static [Field<T>],
}

impl<T> Layout<T> {
    pub const fn new(packet: &'static str, fields: &'static [Field<T>]) -> Self {
        Self { packet, fields }
    }

    /// Fields that exist in `version`, in wire order.
    pub fn fields_for(&self, version: ProtocolVersion) -> impl Iterator<Item = &Field<T>> + '_ {
        self.fields
            .iter()
            .filter(move |field| field.range.contains(version))
    }

    pub fn read_into(&self, reader: &mut PacketReader<'_>, target: &mut T) -> CodecResult<()> {
        let version = reader.version();
        for field in self.fields_for(version) {
            (field.read)(reader, target)?;
        }
        Ok(())
    }

    pub fn read(&self, reader: &mut PacketReader<'_>) -> CodecResult<T>
    where
        T: Default,
    {
        let mut value = T::default();
        self.read_into(reader, &mut value)?;
        Ok(value)
    }

    pub fn write(&self, writer: &mut PacketWriter, value: &T) -> CodecResult<()> {
        let version = writer.version();
        for field in self.fields.iter().filter(|f| !f.range.contains(version)) {
            let Some(present) = field.present else {
                continue;
            };
            if present(value) && !self.has_field(field.name, version) {
                return Err(CodecError::FieldNotInVersion {
                    field: field.name,
                    version,
                });
            }
        }
        for field in self.fields_for(version) {
            (field.write)(writer, value)?;
        }
        Ok(())
    }

    /// Whether any encoding of `name` exists in `version`.
    pub fn has_field(&self, name: &str, version: ProtocolVersion) -> bool {
        self.fields_for(version).any(|field| field.name == name)
    }

    /// Check that every field's encodings cover disjoint, contiguous ranges.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut by_name: BTreeMap<&'static str, Vec<VersionRange>> = BTreeMap::new();
        for field in self.fields {
            if field.range.is_empty() {
                return Err(LayoutError::EmptyRange {
                    packet: self.packet,
                    field: field.name,
                });
            }
            by_name.entry(field.name).or_default().push(field.range);
        }
        for (name, mut ranges) in by_name {
            ranges.sort_by_key(|range| range.since);
            for pair in ranges.windows(2) {
                let (earlier, later) = (pair[0], pair[1]);
                match earlier.until {
                    Some(until) if until == later.since => {}
                    Some(until) if until < later.since => {
                        return Err(LayoutError::Gap {
                            packet: self.packet,
                            field: name,
                            at: later.since,
                        })
                    }
                    _ => {
                        return Err(LayoutError::Overlap {
                            packet: self.packet,
                            field: name,
                            at: later.since,
                        })
                    }
                }
            }
        }
        Ok(())
    }
}
