//! Hierarchical object paths.
//!
//! Paths identify objects on storage by their position in the group hierarchy,
//! e.g. `/acquisition/fscv_response_series`. They never encode memory identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::util::{Error, Result};

/// Absolute, slash-separated path of an object in a recording.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectPath(String);

impl ObjectPath {
    /// The root group.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse an absolute path.
    ///
    /// Paths start with `/`, have no empty segments and no trailing slash
    /// (except the root itself).
    pub fn parse(s: &str) -> Result<Self> {
        if s == "/" {
            return Ok(Self::root());
        }
        let Some(rest) = s.strip_prefix('/') else {
            return Err(Error::invalid(format!("object path '{}' is not absolute", s)));
        };
        if rest.split('/').any(|seg| seg.is_empty()) {
            return Err(Error::invalid(format!("object path '{}' has an empty segment", s)));
        }
        Ok(Self(s.to_string()))
    }

    /// Path of a child named `name` below this one.
    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self(format!("/{}", name))
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// Last segment; empty for the root.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Parent path; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(pos) => Some(Self(self.0[..pos].to_string())),
            None => None,
        }
    }

    /// Iterate over segments from the root down.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Check if this is the root group.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ObjectPath> for String {
    fn from(p: ObjectPath) -> Self {
        p.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_name() {
        let p = ObjectPath::root().join("acquisition").join("fscv_response_series");
        assert_eq!(p.as_str(), "/acquisition/fscv_response_series");
        assert_eq!(p.name(), "fscv_response_series");
        assert_eq!(p.parent().unwrap().as_str(), "/acquisition");
        assert_eq!(p.parent().unwrap().parent(), Some(ObjectPath::root()));
        assert_eq!(ObjectPath::root().parent(), None);
    }

    #[test]
    fn test_parse_rejects_relative_and_empty() {
        assert!(ObjectPath::parse("acquisition/x").is_err());
        assert!(ObjectPath::parse("/acquisition//x").is_err());
        assert!(ObjectPath::parse("/acquisition/").is_err());
        assert!(ObjectPath::parse("/").unwrap().is_root());
    }

    #[test]
    fn test_segments() {
        let p = ObjectPath::parse("/general/extracellular_ephys/electrodes").unwrap();
        let segs: Vec<&str> = p.segments().collect();
        assert_eq!(segs, vec!["general", "extracellular_ephys", "electrodes"]);
    }

    #[test]
    fn test_serde_validates() {
        let p: ObjectPath = serde_json::from_str("\"/stimulus/exc\"").unwrap();
        assert_eq!(p.name(), "exc");
        assert!(serde_json::from_str::<ObjectPath>("\"stimulus\"").is_err());
    }
}
