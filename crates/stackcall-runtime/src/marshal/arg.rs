//! Extracted native-side argument values

use crate::frame::ExecutionContext;
use crate::types::SemanticType;
use crate::value::{CallbackRef, RawHandle, ScriptString};
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A native value produced by extracting one parameter.
///
/// Floats are wrapped in `OrderedFloat` so every `Arg` is hashable and can key a
/// mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arg {
    Integer(i64),
    Float(OrderedFloat<f64>),
    String(ScriptString),
    Boolean(bool),
    /// Enum variant value as resolved by the enum registry
    Enum(i64),
    Optional(Option<Box<Arg>>),
    Sequence(Vec<Arg>),
    Mapping(ArgMap),
    /// Winning union alternative and its value
    Union {
        index: usize,
        value: Box<Arg>,
    },
    /// `None` when the downcast failed
    Handle(Option<RawHandle>),
    Callback(Option<CallbackRef>),
    Context(ExecutionContext),
    Placeholder,
}

impl Arg {
    /// Zero value returned for a parameter that failed to extract
    pub fn default_for(ty: &SemanticType) -> Arg {
        match ty {
            SemanticType::Number(kind) if kind.is_integer() => Arg::Integer(0),
            SemanticType::Number(_) => Arg::Float(OrderedFloat(0.0)),
            SemanticType::String => Arg::String(ScriptString::default()),
            SemanticType::Boolean => Arg::Boolean(false),
            SemanticType::Enum(_) => Arg::Enum(0),
            SemanticType::Optional(_) => Arg::Optional(None),
            SemanticType::Sequence(_) => Arg::Sequence(Vec::new()),
            SemanticType::Mapping(_, _) => Arg::Mapping(ArgMap::new()),
            SemanticType::Union(alternatives) => Arg::Union {
                index: 0,
                value: Box::new(
                    alternatives
                        .first()
                        .map_or(Arg::Placeholder, Arg::default_for),
                ),
            },
            SemanticType::Handle(_) => Arg::Handle(None),
            SemanticType::Callback => Arg::Callback(None),
            SemanticType::Context => Arg::Context(ExecutionContext::default()),
            SemanticType::Placeholder => Arg::Placeholder,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Float(f) => Some(f.into_inner()),
            Arg::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Arg::Integer(i) | Arg::Enum(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::String(s) => s.to_str(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Arg::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Short kind name used in conversion errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Arg::Integer(_) => "integer",
            Arg::Float(_) => "float",
            Arg::String(_) => "string",
            Arg::Boolean(_) => "boolean",
            Arg::Enum(_) => "enum",
            Arg::Optional(_) => "optional",
            Arg::Sequence(_) => "sequence",
            Arg::Mapping(_) => "mapping",
            Arg::Union { .. } => "union",
            Arg::Handle(_) => "handle",
            Arg::Callback(_) => "function",
            Arg::Context(_) => "context",
            Arg::Placeholder => "placeholder",
        }
    }
}

/// Insertion-ordered map of extracted pairs; a repeated key replaces the earlier value.
///
/// `index` maps each key to its slot in `entries`, so inserts and lookups stay O(1).
#[derive(Clone, Default)]
pub struct ArgMap {
    entries: Vec<(Arg, Arg)>,
    index: HashMap<Arg, usize>,
}

impl ArgMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Arg, value: Arg) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &Arg) -> Option<&Arg> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arg, &Arg)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn into_hash_map(self) -> HashMap<Arg, Arg> {
        self.entries.into_iter().collect()
    }
}

impl fmt::Debug for ArgMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// Equality and hashing follow the ordered entries; the index is derived from them.
impl PartialEq for ArgMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for ArgMap {}

impl Hash for ArgMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
    }
}

impl IntoIterator for ArgMap {
    type Item = (Arg, Arg);
    type IntoIter = std::vec::IntoIter<(Arg, Arg)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
