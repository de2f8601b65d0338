//! Navigation paths between entity types.

use serde::{Serialize, Serializer};
use std::fmt;

/// Separator between navigation segments.
pub const SEPARATOR: char = '/';

/// An ordered, non-empty chain of navigation properties, e.g.
/// `Things/Datastreams/Observations`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigationPath {
    segments: Vec<&'static str>,
}

impl NavigationPath {
    /// Returns `None` for an empty segment list; a path always has at least
    /// one hop.
    pub fn new(segments: Vec<&'static str>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    pub fn segments(&self) -> &[&'static str] {
        &self.segments
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Path to the identifier of the related entity, as used in filters.
    pub fn id_path(&self) -> String {
        format!("{}{}id", self, SEPARATOR)
    }
}

impl fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl Serialize for NavigationPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
