//! Version-bracketed lookup tables.
//!
//! A bracket starts at some version and lasts until the next bracket starts.
//! The value for a version is the one attached to the latest bracket start that
//! is `<=` that version; `None` marks a span where the value does not exist.

use crate::version::ProtocolVersion;
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("bracket start {0} declared twice")]
    DuplicateStart(ProtocolVersion),
    #[error("no brackets declared")]
    Empty,
}

/// A value that changes at specific protocol versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBrackets<T> {
    starts: Vec<(ProtocolVersion, Option<T>)>,
}

impl<T> VersionBrackets<T> {
    /// Build from `(start, value)` pairs in any order.
    pub fn new(mut entries: Vec<(ProtocolVersion, Option<T>)>) -> Result<Self, BracketError> {
        if entries.is_empty() {
            return Err(BracketError::Empty);
        }
        entries.sort_by_key(|(start, _)| *start);
        for pair in entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(BracketError::DuplicateStart(pair[0].0));
            }
        }
        Ok(Self { starts: entries })
    }

    /// A single value valid from `since` onwards.
    pub fn from_version(since: ProtocolVersion, value: T) -> Self {
        Self {
            starts: vec![(since, Some(value))],
        }
    }

    pub fn get(&self, version: ProtocolVersion) -> Option<&T> {
        let idx = self.starts.partition_point(|(start, _)| *start <= version);
        if idx == 0 {
            return None;
        }
        self.starts[idx - 1].1.as_ref()
    }

    /// Versions at which the value changes.
    pub fn boundaries(&self) -> impl Iterator<Item = ProtocolVersion> + '_ {
        self.starts.iter().map(|(start, _)| *start)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProtocolVersion, Option<&T>)> + '_ {
        self.starts.iter().map(|(start, value)| (*start, value.as_ref()))
    }
}

/// Two entries claimed the same key in the same bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketCollision<K, V> {
    pub version: ProtocolVersion,
    pub key: K,
    pub existing: V,
    pub incoming: V,
}

/// Reverse index over many [`VersionBrackets`]: for each bracket boundary,
/// a hash map from the bracketed key back to its owner.
///
/// Lookups are a binary search over boundaries plus one hash lookup.
#[derive(Debug, Clone)]
pub struct BracketIndex<K, V> {
    boundaries: Vec<ProtocolVersion>,
    maps: Vec<HashMap<K, V>>,
}

impl<K, V> BracketIndex<K, V>
where
    K: Copy + Eq + Hash,
    V: Copy,
{
    pub fn build<'a, I>(entries: I) -> Result<Self, BracketCollision<K, V>>
    where
        I: IntoIterator<Item = (&'a VersionBrackets<K>, V)>,
        K: 'a,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        let mut boundaries: Vec<ProtocolVersion> = entries
            .iter()
            .flat_map(|(brackets, _)| brackets.boundaries())
            .collect();
        boundaries.sort();
        boundaries.dedup();

        let mut maps = Vec::with_capacity(boundaries.len());
        for &boundary in &boundaries {
            let mut map = HashMap::new();
            for (brackets, owner) in &entries {
                let Some(key) = brackets.get(boundary) else {
                    continue;
                };
                if let Some(existing) = map.insert(*key, *owner) {
                    return Err(BracketCollision {
                        version: boundary,
                        key: *key,
                        existing,
                        incoming: *owner,
                    });
                }
            }
            maps.push(map);
        }
        Ok(Self { boundaries, maps })
    }

    pub fn get(&self, version: ProtocolVersion, key: K) -> Option<V> {
        let idx = self.boundaries.partition_point(|start| *start <= version);
        if idx == 0 {
            return None;
        }
        self.maps[idx - 1].get(&key).copied()
    }
}
