use crate::error::{CodecError, CodecResult};

/// A field that only some protocol versions carry.
///
/// `Absent` means the negotiated version's layout has no such field at all.
/// It is distinct from `Option<T>`, which models a flag-byte optional that
/// the version does carry. A field can be both: `Gated<Option<T>>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gated<T> {
    #[default]
    Absent,
    Present(T),
}

impl<T> Gated<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Gated::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Gated::Absent)
    }

    pub fn as_ref(&self) -> Gated<&T> {
        match self {
            Gated::Absent => Gated::Absent,
            Gated::Present(value) => Gated::Present(value),
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Gated::Absent => None,
            Gated::Present(value) => Some(value),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Gated::Absent => None,
            Gated::Present(value) => Some(value),
        }
    }

    /// The value, or `MissingField` when a layout needs it and it is absent.
    pub fn require(&self, field: &'static str) -> CodecResult<&T> {
        self.get().ok_or(CodecError::MissingField(field))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Gated<U> {
        match self {
            Gated::Absent => Gated::Absent,
            Gated::Present(value) => Gated::Present(f(value)),
        }
    }
}

impl<T> From<T> for Gated<T> {
    fn from(value: T) -> Self {
        Gated::Present(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_not_none() {
        let absent: Gated<Option<i32>> = Gated::Absent;
        let none: Gated<Option<i32>> = Gated::Present(None);
        assert_ne!(absent, none);
        assert!(none.is_present());
        assert_eq!(none.require("x").unwrap(), &None);
        assert!(matches!(
            absent.require("x"),
            Err(CodecError::MissingField("x"))
        ));
    }

    #[test]
    fn test_map_and_default() {
        assert_eq!(Gated::<i32>::default(), Gated::Absent);
        assert_eq!(Gated::from(2).map(|v| v * 2), Gated::Present(4));
        assert_eq!(Gated::Present(1).into_option(), Some(1));
    }
}
