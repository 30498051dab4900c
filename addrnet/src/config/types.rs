//! Comma-separated string types that survive being passed through files and
//! environment variables unchanged.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt::Display};

/// Separator used by [`List`], [`Map`] and [`split`].
pub const SPLITTER: &str = ",";

pub fn split(s: &str) -> std::str::Split<'_, &'static str> {
    s.split(SPLITTER)
}

/// A comma-separated list of strings, e.g. `stdout,/var/log/app.log`.
///
/// Deserializes from either the joined string or a sequence of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct List(String);

impl List {
    pub fn new<I, S>(items: I) -> List
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items
            .into_iter()
            .map(|item| item.as_ref().to_string())
            .collect();
        List(items.join(SPLITTER))
    }

    /// The items of the list, empty entries dropped.
    pub fn to_vec(&self) -> Vec<String> {
        split(&self.0)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for List {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for List {
    fn from(value: &str) -> Self {
        List(value.to_string())
    }
}

impl From<String> for List {
    fn from(value: String) -> Self {
        List(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListRepr {
    Joined(String),
    Items(Vec<String>),
}

impl Serialize for List {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for List {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match ListRepr::deserialize(deserializer)? {
            ListRepr::Joined(joined) => List(joined),
            ListRepr::Items(items) => List::new(items),
        })
    }
}

/// Comma-separated `key=value` pairs, e.g. `RUST_LOG=debug,HOME=/srv`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Map(String);

impl Map {
    /// Joins the pairs in iteration order.
    pub fn new<I, K, V>(pairs: I) -> Map
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let joined: Vec<String> = pairs
            .into_iter()
            .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
            .collect();
        Map(joined.join(SPLITTER))
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        self.nav_pairs(|key, val| {
            out.insert(key.to_string(), val.to_string());
        });
        out
    }

    /// The pairs as `key=value` strings, ready for a process environment.
    pub fn to_env(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.nav_pairs(|key, val| out.push(format!("{key}={val}")));
        out
    }

    /// Calls `f` for every well-formed pair. Entries that aren't exactly one
    /// `key=value` are skipped.
    pub fn nav_pairs<'a>(&'a self, mut f: impl FnMut(&'a str, &'a str)) {
        for pair in split(&self.0) {
            let mut kv = pair.split('=');
            if let (Some(key), Some(val), None) = (kv.next(), kv.next(), kv.next()) {
                f(key, val);
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Map {
    fn from(value: &str) -> Self {
        Map(value.to_string())
    }
}

impl From<String> for Map {
    fn from(value: String) -> Self {
        Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_list_drops_empty_entries() {
        let list = List::from("stdout,,/tmp/app.log,");
        assert_eq!(list.to_vec(), vec!["stdout", "/tmp/app.log"]);
        assert!(List::default().to_vec().is_empty());
    }

    #[test]
    fn test_types_list_new_joins() {
        let list = List::new(["a", "b", "c"]);
        assert_eq!(list.to_string(), "a,b,c");
        assert_eq!(list.to_vec(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_types_list_deserialize_string_or_sequence() {
        let list: List = serde_json::from_str("\"stdout,stderr\"").unwrap();
        assert_eq!(list, List::from("stdout,stderr"));
        let list: List = serde_json::from_str("[\"stdout\", \"stderr\"]").unwrap();
        assert_eq!(list, List::from("stdout,stderr"));
        assert_eq!(serde_json::to_string(&list).unwrap(), "\"stdout,stderr\"");
    }

    #[test]
    fn test_types_map_pairs() {
        let map = Map::from("a=1,b=2,broken,c=3=4,=5");
        let parsed = map.to_map();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed["a"], "1");
        assert_eq!(parsed["b"], "2");
        assert_eq!(parsed[""], "5");
        assert_eq!(map.to_env(), vec!["a=1", "b=2", "=5"]);
    }

    #[test]
    fn test_types_map_new_from_btreemap() {
        let mut pairs = BTreeMap::new();
        pairs.insert("RUST_LOG", "debug");
        pairs.insert("HOME", "/srv");
        let map = Map::new(&pairs);
        assert_eq!(map.as_str(), "HOME=/srv,RUST_LOG=debug");
        assert_eq!(map.to_map().len(), 2);
    }
}
