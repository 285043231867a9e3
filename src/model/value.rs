//! Attribute value type for map attribute tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single attribute-table value as read from an imported map.
///
/// Covers what shapefile-backed tables actually hold:
/// - Scalars: Int, Float, String
/// - Null for unset cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AttrValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
}

// ============================================================================
// Truthiness and names
// ============================================================================

impl AttrValue {
    /// Attribute-table truthiness: null, zero and the empty string are unset.
    pub fn is_set(&self) -> bool {
        match self {
            AttrValue::Null => false,
            AttrValue::Int(i) => *i != 0,
            AttrValue::Float(f) => *f != 0.0,
            AttrValue::String(s) => !s.is_empty(),
        }
    }

    /// Name-like rendering used when an attribute identifies a feature.
    ///
    /// Numeric names are common in groundwater cell maps, so integers are
    /// accepted too. Unset values yield `None`.
    pub fn as_feature_name(&self) -> Option<String> {
        if !self.is_set() {
            return None;
        }
        match self {
            AttrValue::String(s) => Some(s.clone()),
            AttrValue::Int(i) => Some(i.to_string()),
            AttrValue::Float(f) => Some(f.to_string()),
            AttrValue::Null => None,
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self { AttrValue::Int(v) }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self { AttrValue::Int(v as i64) }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self { AttrValue::Float(v) }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self { AttrValue::String(v.to_string()) }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self { AttrValue::String(v) }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(AttrValue::Null, Into::into)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => write!(f, "null"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::String(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_values() {
        assert!(!AttrValue::Null.is_set());
        assert!(!AttrValue::from("").is_set());
        assert!(!AttrValue::Int(0).is_set());
        assert!(AttrValue::from("GW1").is_set());
    }

    #[test]
    fn feature_names() {
        assert_eq!(AttrValue::from(" Catch A ").as_feature_name().as_deref(), Some(" Catch A "));
        assert_eq!(AttrValue::Int(17).as_feature_name().as_deref(), Some("17"));
        assert_eq!(AttrValue::from("").as_feature_name(), None);
        assert_eq!(AttrValue::from(None::<&str>), AttrValue::Null);
    }
}
