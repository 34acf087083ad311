//! Versioned column values.

use std::fmt;

/// Revision marker attached to a stored value.
///
/// By convention this is the cell timestamp in milliseconds since the Unix
/// epoch, but any monotonically comparable counter works.
pub type Version = u64;

/// One revision of one column: a value and the version it was written at.
///
/// Immutable once constructed. `Versioned` is the element type of the
/// multi-valued attribute shapes (`Option<Versioned<V>>`,
/// `Vec<Versioned<V>>`, `BTreeMap<String, Versioned<V>>`).
///
/// # Example
///
/// ```
/// use cellmap_db::Versioned;
///
/// let score = Versioned::new(90_i64, 1_700_000_000_000);
/// assert_eq!(*score.value(), 90);
/// assert_eq!(score.version(), 1_700_000_000_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Versioned<V> {
    value: V,
    version: Version,
}

impl<V> Versioned<V> {
    pub fn new(value: V, version: Version) -> Self {
        Self { value, version }
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn into_parts(self) -> (V, Version) {
        (self.value, self.version)
    }

    /// Transform the value, keeping the version.
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Versioned<U> {
        Versioned {
            value: f(self.value),
            version: self.version,
        }
    }
}

impl<V> From<(V, Version)> for Versioned<V> {
    fn from((value, version): (V, Version)) -> Self {
        Self::new(value, version)
    }
}

impl<V: fmt::Display> fmt::Display for Versioned<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.value, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_accessors() {
        let v = Versioned::new("Ann".to_string(), 42);
        assert_eq!(v.value(), "Ann");
        assert_eq!(v.version(), 42);
        assert_eq!(v.clone().into_parts(), ("Ann".to_string(), 42));
        assert_eq!(v.into_value(), "Ann");
    }

    #[test]
    fn test_versioned_map_keeps_version() {
        let v = Versioned::new(2_i32, 7).map(|x| x * 10);
        assert_eq!(v, Versioned::new(20, 7));
    }

    #[test]
    fn test_versioned_from_tuple_and_display() {
        let v: Versioned<i64> = (88, 3).into();
        assert_eq!(v.to_string(), "88@3");
    }
}
