//! Folding fragments into a single rendering context.
//!
//! Every fragment key is objectified into a single-branch nested value and
//! bound under its first path segment. Bindings that share a top-level key
//! are never deep-merged: one binding is stored as-is, several are stored
//! as a sequence in the order the fragments were given.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::parse::Fragment;

static ORDERING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}-").expect("ordering prefix pattern is valid"));

/// Remove a leading `NN-` ordering prefix from a name.
pub fn strip_ordering_prefix(name: &str) -> &str {
    match ORDERING_PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// Turn a `/`-delimited key into its top-level segment and nested value.
///
/// A single-segment key binds the value directly. Deeper keys produce
/// `{segment: ... {name, data}}`, with the ordering prefix stripped from
/// the leaf name only.
pub fn objectify(key: &str, value: Value) -> (String, Value) {
    let segments: Vec<&str> = key.split('/').collect();

    let Some((leaf, parents)) = segments.split_last() else {
        return (key.to_string(), value);
    };
    if parents.is_empty() {
        return (key.to_string(), value);
    }

    let mut node = Map::new();
    node.insert("name".to_string(), Value::String(strip_ordering_prefix(leaf).to_string()));
    node.insert("data".to_string(), value);
    let mut node = Value::Object(node);

    for segment in parents[1..].iter().rev() {
        let mut wrapper = Map::new();
        wrapper.insert((*segment).to_string(), node);
        node = Value::Object(wrapper);
    }

    (parents[0].to_string(), node)
}

/// Value bound to one top-level context key.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Exactly one fragment contributed
    Single(Value),
    /// Several fragments contributed, in merge order
    Sequence(Vec<Value>),
}

impl Entry {
    /// The entry as a plain value (sequences become arrays).
    pub fn to_value(&self) -> Value {
        match self {
            Entry::Single(value) => value.clone(),
            Entry::Sequence(values) => Value::Array(values.clone()),
        }
    }
}

/// The aggregated mapping templates render against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Vec<(String, Entry)>,
}

impl Context {
    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    /// Top-level keys in first-contribution order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no fragment contributed anything.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The whole context as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, e)| (k.clone(), e.to_value()))
                .collect(),
        )
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            match entry {
                Entry::Single(value) => map.serialize_entry(key, value)?,
                Entry::Sequence(values) => map.serialize_entry(key, values)?,
            }
        }
        map.end()
    }
}

/// Aggregate fragments, in order, into a context.
pub fn aggregate(fragments: &[Option<Fragment>]) -> Context {
    let mut grouped: Vec<(String, Vec<Value>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for fragment in fragments.iter().flatten() {
        for (key, value) in fragment {
            let (top, node) = objectify(key, value.clone());
            match index.get(&top) {
                Some(&i) => grouped[i].1.push(node),
                None => {
                    index.insert(top.clone(), grouped.len());
                    grouped.push((top, vec![node]));
                }
            }
        }
    }

    let entries = grouped
        .into_iter()
        .map(|(key, mut values)| {
            let entry = if values.len() == 1 {
                Entry::Single(values.remove(0))
            } else {
                Entry::Sequence(values)
            };
            (key, entry)
        })
        .collect();

    Context { entries }
}
