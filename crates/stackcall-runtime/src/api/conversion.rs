//! Type conversion between Rust and frame values
//!
//! - `Param` - the semantic type a Rust parameter type is declared as
//! - `FromArg` - convert an extracted `Arg` into a Rust type
//! - `IntoValue` - convert a Rust value into a frame `Value`
//! - `IntoReturn` - convert a native function's result into a `Return`
//!
//! # Examples
//!
//! ```
//! use stackcall_runtime::api::{FromArg, IntoValue, Param};
//! use stackcall_runtime::{Arg, SemanticType, Value};
//!
//! assert_eq!(<Option<bool>>::semantic_type(), SemanticType::optional(SemanticType::Boolean));
//!
//! let flag: Option<bool> = FromArg::from_arg(Arg::Optional(None)).unwrap();
//! assert_eq!(flag, None);
//!
//! assert_eq!(2.5f64.into_value(), Value::Number(2.5));
//! ```

use crate::dispatch::Return;
use crate::frame::ExecutionContext;
use crate::marshal::Arg;
use crate::types::{NumberKind, SemanticType};
use crate::value::{CallbackRef, RawHandle, ScriptString, Table, Value};
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

/// Error type for argument conversion failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("element {index}: expected {expected}, found {found}")]
    ElementTypeMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("{value} does not fit in {target}")]
    OutOfRange { value: i64, target: &'static str },
}

fn mismatch(expected: &str, found: &Arg) -> ConversionError {
    ConversionError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

/// Rust types usable as declared parameters
pub trait Param {
    fn semantic_type() -> SemanticType;
}

/// Trait for converting an extracted `Arg` to a Rust type
pub trait FromArg: Sized {
    /// # Errors
    ///
    /// Returns `ConversionError` if the argument has a different shape.
    fn from_arg(arg: Arg) -> Result<Self, ConversionError>;
}

/// Trait for converting a Rust value to a frame `Value`
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Trait for converting a native function's result to a `Return`
pub trait IntoReturn {
    fn into_return(self) -> Return;
}

/// Marker for a padding parameter that only matches a missing argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placeholder;

// Integers

macro_rules! integer_conversions {
    ($($ty:ty => $kind:expr),* $(,)?) => {$(
        impl Param for $ty {
            fn semantic_type() -> SemanticType {
                SemanticType::Number($kind)
            }
        }

        impl FromArg for $ty {
            fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
                match arg {
                    Arg::Integer(i) | Arg::Enum(i) => {
                        <$ty>::try_from(i).map_err(|_| ConversionError::OutOfRange {
                            value: i,
                            target: stringify!($ty),
                        })
                    }
                    other => Err(mismatch("integer", &other)),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::Number(self as f64)
            }
        }
    )*};
}

integer_conversions! {
    i16 => NumberKind::I16,
    u16 => NumberKind::U16,
    i32 => NumberKind::I32,
    u32 => NumberKind::U32,
}

impl FromArg for i64 {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        arg.as_i64().ok_or_else(|| mismatch("integer", &arg))
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Number(self as f64)
    }
}

// Floats

impl Param for f64 {
    fn semantic_type() -> SemanticType {
        SemanticType::Number(NumberKind::F64)
    }
}

impl FromArg for f64 {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        arg.as_f64().ok_or_else(|| mismatch("number", &arg))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

impl Param for f32 {
    fn semantic_type() -> SemanticType {
        SemanticType::Number(NumberKind::F32)
    }
}

impl FromArg for f32 {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        arg.as_f64()
            .map(|n| n as f32)
            .ok_or_else(|| mismatch("number", &arg))
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Number(self as f64)
    }
}

// Strings

impl Param for String {
    fn semantic_type() -> SemanticType {
        SemanticType::String
    }
}

impl FromArg for String {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        match arg {
            Arg::String(s) => Ok(s.to_string_lossy()),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl Param for ScriptString {
    fn semantic_type() -> SemanticType {
        SemanticType::String
    }
}

impl FromArg for ScriptString {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        match arg {
            Arg::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl IntoValue for ScriptString {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

// bool

impl Param for bool {
    fn semantic_type() -> SemanticType {
        SemanticType::Boolean
    }
}

impl FromArg for bool {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        arg.as_bool().ok_or_else(|| mismatch("boolean", &arg))
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

// Option<T>

impl<T: Param> Param for Option<T> {
    fn semantic_type() -> SemanticType {
        SemanticType::optional(T::semantic_type())
    }
}

impl<T: FromArg> FromArg for Option<T> {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        match arg {
            Arg::Optional(None) => Ok(None),
            Arg::Optional(Some(inner)) => T::from_arg(*inner).map(Some),
            other => T::from_arg(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            None => Value::Nil,
            Some(v) => v.into_value(),
        }
    }
}

// Vec<T> (sequence)

impl<T: Param> Param for Vec<T> {
    fn semantic_type() -> SemanticType {
        SemanticType::sequence(T::semantic_type())
    }
}

impl<T: FromArg> FromArg for Vec<T> {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        match arg {
            Arg::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    T::from_arg(item).map_err(|err| match err {
                        ConversionError::TypeMismatch { expected, found } => {
                            ConversionError::ElementTypeMismatch {
                                index,
                                expected,
                                found,
                            }
                        }
                        other => other,
                    })
                })
                .collect(),
            other => Err(mismatch("sequence", &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::sequence(self.into_iter().map(IntoValue::into_value))
    }
}

// HashMap<K, V> (mapping)

impl<K: Param, V: Param> Param for HashMap<K, V> {
    fn semantic_type() -> SemanticType {
        SemanticType::mapping(K::semantic_type(), V::semantic_type())
    }
}

impl<K: FromArg + Eq + Hash, V: FromArg> FromArg for HashMap<K, V> {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        match arg {
            Arg::Mapping(map) => map
                .into_iter()
                .map(|(k, v)| -> Result<(K, V), ConversionError> {
                    Ok((K::from_arg(k)?, V::from_arg(v)?))
                })
                .collect(),
            other => Err(mismatch("mapping", &other)),
        }
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for HashMap<K, V> {
    fn into_value(self) -> Value {
        Value::Table(Table::from_pairs(
            self.into_iter().map(|(k, v)| (k.into_value(), v.into_value())),
        ))
    }
}

// Handles, callbacks, context

impl FromArg for RawHandle {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        match arg {
            Arg::Handle(Some(handle)) => Ok(handle),
            other => Err(mismatch("handle", &other)),
        }
    }
}

impl IntoValue for RawHandle {
    fn into_value(self) -> Value {
        Value::LightUserData(self)
    }
}

impl Param for CallbackRef {
    fn semantic_type() -> SemanticType {
        SemanticType::Callback
    }
}

impl FromArg for CallbackRef {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        match arg {
            Arg::Callback(Some(callback)) => Ok(callback),
            other => Err(mismatch("function", &other)),
        }
    }
}

impl IntoValue for CallbackRef {
    fn into_value(self) -> Value {
        Value::Function(self)
    }
}

impl Param for ExecutionContext {
    fn semantic_type() -> SemanticType {
        SemanticType::Context
    }
}

impl FromArg for ExecutionContext {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        match arg {
            Arg::Context(context) => Ok(context),
            other => Err(mismatch("context", &other)),
        }
    }
}

impl Param for Placeholder {
    fn semantic_type() -> SemanticType {
        SemanticType::Placeholder
    }
}

impl FromArg for Placeholder {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        match arg {
            Arg::Placeholder => Ok(Placeholder),
            other => Err(mismatch("placeholder", &other)),
        }
    }
}

impl FromArg for Arg {
    fn from_arg(arg: Arg) -> Result<Self, ConversionError> {
        Ok(arg)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for Table {
    fn into_value(self) -> Value {
        Value::Table(self)
    }
}

// Returns

impl IntoReturn for () {
    fn into_return(self) -> Return {
        Return::None
    }
}

impl IntoReturn for Return {
    fn into_return(self) -> Return {
        self
    }
}

macro_rules! value_returns {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoReturn for $ty {
            fn into_return(self) -> Return {
                Return::Value(self.into_value())
            }
        }
    )*};
}

value_returns!(
    i16,
    u16,
    i32,
    u32,
    i64,
    f32,
    f64,
    bool,
    String,
    &str,
    ScriptString,
    RawHandle,
    CallbackRef,
    Value,
    Table,
);

impl<T: IntoValue> IntoReturn for Option<T> {
    fn into_return(self) -> Return {
        Return::Value(self.into_value())
    }
}

impl<T: IntoValue> IntoReturn for Vec<T> {
    fn into_return(self) -> Return {
        Return::Value(self.into_value())
    }
}

impl<K: IntoValue, V: IntoValue> IntoReturn for HashMap<K, V> {
    fn into_return(self) -> Return {
        Return::Value(self.into_value())
    }
}

impl<A: IntoValue, B: IntoValue> IntoReturn for (A, B) {
    fn into_return(self) -> Return {
        Return::Values(vec![self.0.into_value(), self.1.into_value()])
    }
}

impl<A: IntoValue, B: IntoValue, C: IntoValue> IntoReturn for (A, B, C) {
    fn into_return(self) -> Return {
        Return::Values(vec![
            self.0.into_value(),
            self.1.into_value(),
            self.2.into_value(),
        ])
    }
}
