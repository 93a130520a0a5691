//! Semantic parameter types
//!
//! `SemanticType` is the closed set of argument shapes the marshaller understands.
//! A bound function's signature is an ordered list of these, built once at
//! registration.
//!
//! `TypeNames` renders types and slot values for diagnostics.

use crate::frame::Slots;
use crate::registry::Registries;
use crate::value::{format_number, SlotKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest string sample shown in a diagnostic
const SAMPLE_LEN: usize = 10;

/// Registry key of a native class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(name: impl Into<String>) -> Self {
        ClassId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        ClassId(s.to_string())
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry key of an enum type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnumId(String);

impl EnumId {
    pub fn new(name: impl Into<String>) -> Self {
        EnumId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EnumId {
    fn from(s: &str) -> Self {
        EnumId(s.to_string())
    }
}

/// Native numeric representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberKind {
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl NumberKind {
    pub fn is_integer(self) -> bool {
        !matches!(self, NumberKind::F32 | NumberKind::F64)
    }

    /// Inclusive bounds of an integer kind
    pub fn integer_bounds(self) -> (f64, f64) {
        match self {
            NumberKind::I16 => (i16::MIN as f64, i16::MAX as f64),
            NumberKind::U16 => (0.0, u16::MAX as f64),
            NumberKind::I32 => (i32::MIN as f64, i32::MAX as f64),
            NumberKind::U32 => (0.0, u32::MAX as f64),
            NumberKind::F32 | NumberKind::F64 => (f64::MIN, f64::MAX),
        }
    }
}

/// Argument shape of one formal parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    Number(NumberKind),
    String,
    Boolean,
    /// Enum passed as its variant name
    Enum(EnumId),
    /// May be absent; does not consume a slot when the inner type does not match
    Optional(Box<SemanticType>),
    /// Table read as a list of `T`
    Sequence(Box<SemanticType>),
    /// Table read as a `K -> V` map
    Mapping(Box<SemanticType>, Box<SemanticType>),
    /// First matching alternative wins, in declared order
    Union(Vec<SemanticType>),
    /// Native object of the given class
    Handle(ClassId),
    /// Script function reference
    Callback,
    /// The ambient execution context; never consumes a slot
    Context,
    /// Pads shorter overloads; only matches when no argument is present
    Placeholder,
}

impl SemanticType {
    pub fn number() -> Self {
        SemanticType::Number(NumberKind::F64)
    }

    pub fn optional(inner: SemanticType) -> Self {
        SemanticType::Optional(Box::new(inner))
    }

    pub fn sequence(element: SemanticType) -> Self {
        SemanticType::Sequence(Box::new(element))
    }

    pub fn mapping(key: SemanticType, value: SemanticType) -> Self {
        SemanticType::Mapping(Box::new(key), Box::new(value))
    }

    pub fn union(alternatives: impl IntoIterator<Item = SemanticType>) -> Self {
        SemanticType::Union(alternatives.into_iter().collect())
    }

    pub fn enumeration(id: impl Into<EnumId>) -> Self {
        SemanticType::Enum(id.into())
    }

    pub fn handle(class: impl Into<ClassId>) -> Self {
        SemanticType::Handle(class.into())
    }
}

/// Display names for types and slot values
pub struct TypeNames<'a> {
    registries: &'a Registries,
}

impl<'a> TypeNames<'a> {
    pub fn new(registries: &'a Registries) -> Self {
        Self { registries }
    }

    /// Name shown as the "Expected ..." part of a diagnostic
    pub fn name_of(&self, ty: &SemanticType) -> String {
        match ty {
            SemanticType::Number(_) => "number".to_string(),
            SemanticType::String => "string".to_string(),
            SemanticType::Boolean => "boolean".to_string(),
            SemanticType::Enum(id) => self
                .registries
                .enums
                .enum_name(id)
                .unwrap_or_else(|| "enum".to_string()),
            SemanticType::Optional(inner) => self.name_of(inner),
            SemanticType::Sequence(_) | SemanticType::Mapping(_, _) => "table".to_string(),
            SemanticType::Union(alternatives) => alternatives
                .iter()
                .map(|alt| self.name_of(alt))
                .collect::<Vec<_>>()
                .join("/"),
            SemanticType::Handle(class) => self.registries.classes.class_name(class),
            SemanticType::Callback => "function".to_string(),
            SemanticType::Context | SemanticType::Placeholder => String::new(),
        }
    }

    /// Sample of the slot at `position`, shown as the "got ..." part of a diagnostic
    pub fn describe_value<S: Slots + ?Sized>(&self, slots: &S, position: usize) -> String {
        match slots.kind_at(position) {
            SlotKind::Number => match slots.read_number(position) {
                Some(n) => format!("number ({})", format_number(n)),
                None => "number".to_string(),
            },
            SlotKind::String => match slots.read_string(position) {
                Some(s) => describe_string(s.as_bytes()),
                None => "string".to_string(),
            },
            SlotKind::Boolean => format!("boolean ({})", slots.read_boolean(position)),
            SlotKind::UserData | SlotKind::LightUserData => match slots.read_handle(position) {
                Some(handle) => self.registries.classes.runtime_class_name(handle.resolve()),
                None => "userdata".to_string(),
            },
            kind => kind.name().to_string(),
        }
    }
}

/// `string ("sample")`, or just `string` for binary content
fn describe_string(bytes: &[u8]) -> String {
    let mut sample = bytes[..bytes.len().min(SAMPLE_LEN)].to_vec();
    if bytes.len() > SAMPLE_LEN {
        sample[SAMPLE_LEN - 3..].copy_from_slice(b"...");
    }

    if sample.iter().any(|b| !(0x20..=0x7e).contains(b)) {
        return "string".to_string();
    }

    // Printable ASCII only at this point
    format!("string (\"{}\")", String::from_utf8_lossy(&sample))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ClassTable, EnumTable, EnumTables};
    use crate::value::{RawHandle, Value};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;

    fn registries() -> Registries {
        let classes = ClassTable::new();
        classes
            .declare("vehicle", "vehicle", None)
            .register_instance(RawHandle(9), "vehicle");
        let enums = EnumTables::new().with("weather", EnumTable::new("weather-type"));
        Registries::new(Arc::new(classes), Arc::new(enums))
    }

    #[rstest]
    #[case(SemanticType::number(), "number")]
    #[case(SemanticType::Number(NumberKind::U16), "number")]
    #[case(SemanticType::String, "string")]
    #[case(SemanticType::Boolean, "boolean")]
    #[case(SemanticType::enumeration("weather"), "weather-type")]
    #[case(SemanticType::enumeration("unknown"), "enum")]
    #[case(SemanticType::optional(SemanticType::Boolean), "boolean")]
    #[case(SemanticType::sequence(SemanticType::String), "table")]
    #[case(SemanticType::mapping(SemanticType::String, SemanticType::number()), "table")]
    #[case(SemanticType::union([SemanticType::number(), SemanticType::String]), "number/string")]
    #[case(SemanticType::handle("vehicle"), "vehicle")]
    #[case(SemanticType::Callback, "function")]
    #[case(SemanticType::Context, "")]
    #[case(SemanticType::Placeholder, "")]
    fn test_name_of(#[case] ty: SemanticType, #[case] expected: &str) {
        let registries = registries();
        assert_eq!(TypeNames::new(&registries).name_of(&ty), expected);
    }

    #[rstest]
    #[case(Value::Number(42.0), "number (42)")]
    #[case(Value::Number(1.5), "number (1.5)")]
    #[case(Value::string("hello"), "string (\"hello\")")]
    #[case(Value::string("0123456789"), "string (\"0123456789\")")]
    #[case(Value::string("hello world!"), "string (\"hello w...\")")]
    #[case(Value::string("bin\u{1}ary"), "string")]
    #[case(Value::string(b"\xff\xfe"), "string")]
    #[case(Value::Boolean(true), "boolean (true)")]
    #[case(Value::Boolean(false), "boolean (false)")]
    #[case(Value::Nil, "nil")]
    #[case(Value::sequence(vec![]), "table")]
    #[case(Value::Function(crate::value::CallbackRef(1)), "function")]
    #[case(Value::Thread(crate::value::ThreadRef(1)), "coroutine")]
    #[case(Value::boxed(RawHandle(9)), "vehicle")]
    #[case(Value::LightUserData(RawHandle(9)), "vehicle")]
    #[case(Value::LightUserData(RawHandle(404)), "userdata")]
    fn test_describe_value(#[case] value: Value, #[case] expected: &str) {
        let registries = registries();
        let slots = [value];
        assert_eq!(
            TypeNames::new(&registries).describe_value(&slots[..], 1),
            expected
        );
    }

    #[test]
    fn test_describe_absent_slot() {
        let registries = Registries::default();
        let slots: [Value; 0] = [];
        assert_eq!(
            TypeNames::new(&registries).describe_value(&slots[..], 1),
            "none"
        );
    }

    #[test]
    fn test_binary_past_the_sample_is_ignored() {
        let mut bytes = b"abcdefghij".to_vec();
        bytes.push(0);
        assert_eq!(describe_string(&bytes), "string (\"abcdefg...\")");
    }
}
