use crate::buffer::{PacketReader, PacketWriter};
use crate::codec::varint_len;
use crate::error::{CodecError, CodecResult};
use lodestone_data::MappedRegistry;
use lodestone_types::{Identifier, ProtocolVersion};

/// Longest range accepted off the wire. No registry holds more entries.
pub const MAX_RANGE_LEN: u32 = 1 << 16;

/// A set of registry ids, or a reference to a tag.
///
/// Wire header (VarInt): `0` is followed by a tag identifier, `n > 0` by
/// `n - 1` explicit ids, and `n < 0` by a start id for `-n` consecutive ids.
/// The variant records the form, so decoding then encoding is byte-stable.
/// Equality compares the ids, not the form.
#[derive(Debug, Clone)]
pub enum MappedEntitySet {
    Tag(Identifier),
    Ids(Vec<i32>),
    Range { start: i32, len: u32 },
}

impl MappedEntitySet {
    /// Pick the shorter wire form for `ids`.
    pub fn from_ids(ids: Vec<i32>) -> Self {
        if let Some(&start) = ids.first() {
            let consecutive = ids
                .iter()
                .enumerate()
                .all(|(i, &id)| start.checked_add(i as i32) == Some(id));
            if consecutive && ids.len() <= MAX_RANGE_LEN as usize {
                let len = ids.len() as u32;
                let range = Self::Range { start, len };
                let list = Self::Ids(ids);
                return if range.wire_len() < list.wire_len() {
                    range
                } else {
                    list
                };
            }
        }
        Self::Ids(ids)
    }

    /// Resolve entry names to ids for `version`.
    pub fn from_names(
        registry: &MappedRegistry,
        version: ProtocolVersion,
        names: &[Identifier],
    ) -> CodecResult<Self> {
        let ids = names
            .iter()
            .map(|name| {
                registry
                    .get_id(version, name)
                    .ok_or_else(|| CodecError::UnmappedEntity {
                        registry: registry.name(),
                        name: name.to_string(),
                        version,
                    })
            })
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(Self::from_ids(ids))
    }

    /// Explicit ids, or `None` for a tag.
    pub fn ids(&self) -> Option<Vec<i32>> {
        match self {
            Self::Tag(_) => None,
            Self::Ids(ids) => Some(ids.clone()),
            Self::Range { start, len } => Some((0..*len as i32).map(|i| start.saturating_add(i)).collect()),
        }
    }

    pub fn contains(&self, id: i32) -> Option<bool> {
        match self {
            Self::Tag(_) => None,
            Self::Ids(ids) => Some(ids.contains(&id)),
            Self::Range { start, len } => {
                Some(id >= *start && (id as i64) < *start as i64 + *len as i64)
            }
        }
    }

    pub fn wire_len(&self) -> usize {
        match self {
            Self::Tag(tag) => {
                let text = tag.to_string();
                1 + varint_len(text.len() as i32) + text.len()
            }
            Self::Ids(ids) => {
                varint_len(ids.len() as i32 + 1)
                    + ids.iter().map(|id| varint_len(*id)).sum::<usize>()
            }
            Self::Range { start, len } => varint_len(-(*len as i32)) + varint_len(*start),
        }
    }

    pub fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        let header = reader.read_varint()?;
        match header {
            0 => Ok(Self::Tag(reader.read_identifier()?)),
            n if n > 0 => {
                let count = (n - 1) as usize;
                if count > reader.remaining() {
                    return Err(CodecError::LengthExceedsBuffer {
                        declared: count,
                        remaining: reader.remaining(),
                    });
                }
                Ok(Self::Ids(reader.read_elements(count, |r| r.read_varint())?))
            }
            n if n.unsigned_abs() > MAX_RANGE_LEN => Err(CodecError::ValueOutOfRange {
                what: "id set range length",
                value: -(n as i64),
            }),
            n => {
                let len = n.unsigned_abs();
                let start = reader.read_varint()?;
                if start as i64 + len as i64 - 1 > i32::MAX as i64 {
                    return Err(CodecError::ValueOutOfRange {
                        what: "id set range end",
                        value: start as i64 + len as i64 - 1,
                    });
                }
                Ok(Self::Range { start, len })
            }
        }
    }

    pub fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        match self {
            Self::Tag(tag) => {
                writer.write_varint(0);
                writer.write_identifier(tag)?;
            }
            Self::Ids(ids) => {
                let header = i32::try_from(ids.len() + 1).map_err(|_| CodecError::ValueOutOfRange {
                    what: "id set length",
                    value: ids.len() as i64,
                })?;
                writer.write_varint(header);
                for id in ids {
                    writer.write_varint(*id);
                }
            }
            Self::Range { start, len } => {
                if *len == 0 || *len > MAX_RANGE_LEN {
                    return Err(CodecError::ValueOutOfRange {
                        what: "id set range length",
                        value: *len as i64,
                    });
                }
                writer.write_varint(-(*len as i32));
                writer.write_varint(*start);
            }
        }
        Ok(())
    }
}

impl PartialEq for MappedEntitySet {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Tag(a), Self::Tag(b)) => a == b,
            (Self::Tag(_), _) | (_, Self::Tag(_)) => false,
            (Self::Ids(a), Self::Ids(b)) => a == b,
            (Self::Range { start: a, len: n }, Self::Range { start: b, len: m }) => {
                (a, n) == (b, m)
            }
            (Self::Range { start, len }, Self::Ids(ids))
            | (Self::Ids(ids), Self::Range { start, len }) => {
                ids.len() == *len as usize
                    && ids
                        .iter()
                        .enumerate()
                        .all(|(i, &id)| *start as i64 + i as i64 == id as i64)
            }
        }
    }
}

impl Eq for MappedEntitySet {}
