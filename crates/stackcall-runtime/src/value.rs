//! Call frame value representation
//!
//! The slot values a script interpreter hands to native functions:
//! - Nil, Boolean, Number: immediate values
//! - String: byte string (`ScriptString`), may carry arbitrary binary data
//! - Table: ordered key/value entries, cheap to clone (Arc)
//! - Function, Thread: opaque references owned by the interpreter
//! - UserData / LightUserData: boxed and lightweight native object handles

use std::fmt;
use std::sync::Arc;

/// Immutable byte string, as scripts see strings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptString(Arc<[u8]>);

impl ScriptString {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        ScriptString(Arc::from(bytes.as_ref()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// UTF-8 view, if the bytes are valid UTF-8
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Lossy conversion for native code that wants a `String`
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl Default for ScriptString {
    fn default() -> Self {
        ScriptString::new(b"")
    }
}

impl fmt::Debug for ScriptString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for ScriptString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for ScriptString {
    fn from(s: &str) -> Self {
        ScriptString::new(s)
    }
}

impl From<String> for ScriptString {
    fn from(s: String) -> Self {
        ScriptString::new(s)
    }
}

impl From<&[u8]> for ScriptString {
    fn from(b: &[u8]) -> Self {
        ScriptString::new(b)
    }
}

impl From<Vec<u8>> for ScriptString {
    fn from(b: Vec<u8>) -> Self {
        ScriptString(Arc::from(b))
    }
}

/// Address of a native object exposed to scripts as an untyped token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(pub u64);

/// A handle stored inside a script-owned box; reading it takes one extra dereference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoxedHandle(Arc<RawHandle>);

impl BoxedHandle {
    pub fn new(handle: RawHandle) -> Self {
        BoxedHandle(Arc::new(handle))
    }

    pub fn get(&self) -> RawHandle {
        *self.0
    }
}

/// Reference to a script function held by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackRef(pub u32);

/// Reference to a script coroutine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadRef(pub u32);

/// Table: ordered key/value entries. Cheap to clone (refcount bump).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table(Arc<Vec<(Value, Value)>>);

impl Table {
    pub fn new() -> Self {
        Table(Arc::new(Vec::new()))
    }

    /// Array-style table with keys 1..=n
    pub fn sequence(values: impl IntoIterator<Item = Value>) -> Self {
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Value::Number((i + 1) as f64), v))
            .collect::<Vec<_>>();
        Table(Arc::new(entries))
    }

    /// Table from explicit pairs, enumerated in the given order
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Table(Arc::new(pairs.into_iter().collect()))
    }

    pub fn entries(&self) -> &[(Value, Value)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Dynamic kind tag of a frame slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Position past the last argument
    None,
    Nil,
    Boolean,
    Number,
    String,
    Table,
    Function,
    Thread,
    UserData,
    LightUserData,
}

impl SlotKind {
    /// Name the interpreter uses for this kind
    pub fn name(self) -> &'static str {
        match self {
            SlotKind::None => "none",
            SlotKind::Nil => "nil",
            SlotKind::Boolean => "boolean",
            SlotKind::Number => "number",
            SlotKind::String => "string",
            SlotKind::Table => "table",
            SlotKind::Function => "function",
            SlotKind::Thread => "coroutine",
            SlotKind::UserData => "userdata",
            SlotKind::LightUserData => "userdata",
        }
    }
}

/// A single call frame slot
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Number(f64),
    String(ScriptString),
    Table(Table),
    Function(CallbackRef),
    Thread(ThreadRef),
    UserData(BoxedHandle),
    LightUserData(RawHandle),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl AsRef<[u8]>) -> Self {
        Value::String(ScriptString::new(s))
    }

    /// Create an array-style table value
    pub fn sequence(values: impl IntoIterator<Item = Value>) -> Self {
        Value::Table(Table::sequence(values))
    }

    /// Create a boxed handle value
    pub fn boxed(handle: RawHandle) -> Self {
        Value::UserData(BoxedHandle::new(handle))
    }

    pub fn kind(&self) -> SlotKind {
        match self {
            Value::Nil => SlotKind::Nil,
            Value::Boolean(_) => SlotKind::Boolean,
            Value::Number(_) => SlotKind::Number,
            Value::String(_) => SlotKind::String,
            Value::Table(_) => SlotKind::Table,
            Value::Function(_) => SlotKind::Function,
            Value::Thread(_) => SlotKind::Thread,
            Value::UserData(_) => SlotKind::UserData,
            Value::LightUserData(_) => SlotKind::LightUserData,
        }
    }

    /// Numeric view with string coercion, as the interpreter converts
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => parse_number(s.as_bytes()),
            _ => None,
        }
    }

    /// String view with number coercion
    pub fn to_script_string(&self) -> Option<ScriptString> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(ScriptString::from(format_number(*n))),
            _ => None,
        }
    }

    /// Truthiness: everything except nil and false
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

/// Format a number the way scripts print it: integral values drop the fraction.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        format!("{}", n)
    }
}

/// Parse a numeric string with the interpreter's coercion rules:
/// surrounding whitespace is ignored, decimal and exponent forms are accepted,
/// and `0x` prefixes denote hexadecimal integers.
pub fn parse_number(bytes: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(bytes).ok()?.trim();
    if text.is_empty() {
        return None;
    }

    let (negative, unsigned) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        let magnitude = u64::from_str_radix(hex, 16).ok()? as f64;
        return Some(if negative { -magnitude } else { magnitude });
    }

    // Rust accepts "inf"/"nan" spellings the interpreter does not
    if !unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }

    text.parse::<f64>().ok()
}
