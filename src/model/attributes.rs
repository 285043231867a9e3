//! AttributeMap: the attribute row attached to a map geometry.

use hashbrown::HashMap;
use super::AttrValue;

/// A map of column names to attribute values.
pub type AttributeMap = HashMap<String, AttrValue>;

/// Build an AttributeMap from `(column, value)` pairs.
pub fn attributes<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> AttributeMap
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
