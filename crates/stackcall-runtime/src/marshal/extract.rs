//! Value extraction
//!
//! `Extractor::extract` is the checked entry point used once per formal parameter.
//! It short-circuits once the call has failed, validates the slot structurally,
//! then hands off to the per-type extraction arm. Compound types recurse through
//! the unchecked arms; nested table entries are viewed as small `[Value]` frames so
//! the same arms handle top-level slots and entries alike.

use super::arg::{Arg, ArgMap};
use super::error::{ArgumentError, ErrorKind, ErrorState};
use super::matcher;
use crate::frame::{ExecutionContext, Slots, CONTEXT_SLOT};
use crate::registry::Registries;
use crate::types::{NumberKind, SemanticType, TypeNames};
use ordered_float::OrderedFloat;

/// 1-based read position in a call frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(usize);

impl Cursor {
    /// Cursor at the first argument
    pub fn new() -> Self {
        Cursor(1)
    }

    pub fn at(position: usize) -> Self {
        Cursor(position)
    }

    pub fn position(self) -> usize {
        self.0
    }

    fn advance(&mut self) {
        self.0 += 1;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::new()
    }
}

/// Per-call extraction state
pub struct Extractor<'a> {
    function: &'a str,
    context: ExecutionContext,
    registries: &'a Registries,
    errors: ErrorState,
    /// Top-level argument being extracted; nested failures report this position
    argument: usize,
}

impl<'a> Extractor<'a> {
    pub fn new(function: &'a str, context: ExecutionContext, registries: &'a Registries) -> Self {
        Self {
            function,
            context,
            registries,
            errors: ErrorState::new(),
            argument: 1,
        }
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    pub fn into_errors(self) -> ErrorState {
        self.errors
    }

    /// Extract one formal parameter at the cursor.
    ///
    /// After the first failure of the call this returns `ty`'s default without
    /// reading the frame.
    pub fn extract<S: Slots + ?Sized>(
        &mut self,
        slots: &S,
        cursor: &mut Cursor,
        ty: &SemanticType,
    ) -> Arg {
        if self.errors.is_set() {
            return Arg::default_for(ty);
        }

        self.argument = cursor.position();
        let check_at = match ty {
            SemanticType::Context => CONTEXT_SLOT,
            _ => cursor.position(),
        };

        if !matcher::matches(slots, check_at, ty) {
            let names = TypeNames::new(self.registries);
            let got = names.describe_value(slots, cursor.position());
            self.fail(ErrorKind::StructuralTypeMismatch, names.name_of(ty), &got);
            return Arg::default_for(ty);
        }

        self.extract_unchecked(slots, cursor, ty)
    }

    fn extract_unchecked<S: Slots + ?Sized>(
        &mut self,
        slots: &S,
        cursor: &mut Cursor,
        ty: &SemanticType,
    ) -> Arg {
        let position = cursor.position();
        match ty {
            SemanticType::Number(kind) => {
                cursor.advance();
                self.read_number(slots, position, *kind)
            }
            SemanticType::String => {
                cursor.advance();
                Arg::String(slots.read_string(position).unwrap_or_default())
            }
            SemanticType::Boolean => {
                cursor.advance();
                Arg::Boolean(slots.read_boolean(position))
            }
            SemanticType::Enum(id) => {
                cursor.advance();
                let parsed = slots.read_string(position).and_then(|name| {
                    name.to_str()
                        .and_then(|name| self.registries.enums.parse(id, name))
                });
                match parsed {
                    Some(value) => Arg::Enum(value),
                    None => {
                        self.fail_value(slots, position, ty);
                        Arg::Enum(0)
                    }
                }
            }
            SemanticType::Optional(inner) => {
                if coercible_match(slots, position, inner) {
                    let value = self.extract_unchecked(slots, cursor, inner);
                    Arg::Optional(Some(Box::new(value)))
                } else {
                    Arg::Optional(None)
                }
            }
            SemanticType::Sequence(element) => {
                cursor.advance();
                Arg::Sequence(self.read_sequence(slots, position, element))
            }
            SemanticType::Mapping(key, value) => {
                cursor.advance();
                Arg::Mapping(self.read_mapping(slots, position, key, value))
            }
            SemanticType::Union(alternatives) => {
                match matcher::match_union(slots, position, alternatives) {
                    Some(index) => {
                        let value = self.extract_unchecked(slots, cursor, &alternatives[index]);
                        Arg::Union {
                            index,
                            value: Box::new(value),
                        }
                    }
                    None => Arg::default_for(ty),
                }
            }
            SemanticType::Handle(class) => {
                cursor.advance();
                let Some(handle) = slots.read_handle(position) else {
                    return Arg::Handle(None);
                };
                let raw = handle.resolve();
                match self.registries.classes.downcast(raw, class) {
                    Some(object) => Arg::Handle(Some(object)),
                    None => {
                        let expected = self.registries.classes.class_name(class);
                        let got = self.registries.classes.runtime_class_name(raw);
                        self.fail(ErrorKind::ValueConstraintViolation, expected, &got);
                        Arg::Handle(None)
                    }
                }
            }
            SemanticType::Callback => {
                cursor.advance();
                Arg::Callback(slots.read_callback(position))
            }
            SemanticType::Context => Arg::Context(self.context),
            SemanticType::Placeholder => Arg::Placeholder,
        }
    }

    fn read_number<S: Slots + ?Sized>(
        &mut self,
        slots: &S,
        position: usize,
        kind: NumberKind,
    ) -> Arg {
        let number = match slots.read_number(position) {
            Some(n) if n.is_nan() => {
                self.fail(ErrorKind::ValueConstraintViolation, "number".to_string(), "NaN");
                None
            }
            Some(n) => Some(n),
            None => {
                self.fail_value(slots, position, &SemanticType::Number(kind));
                None
            }
        };

        let Some(n) = number else {
            return Arg::default_for(&SemanticType::Number(kind));
        };

        match kind {
            NumberKind::F64 => Arg::Float(OrderedFloat(n)),
            NumberKind::F32 => Arg::Float(OrderedFloat(n as f32 as f64)),
            _ => {
                let (min, max) = kind.integer_bounds();
                Arg::Integer(n.trunc().clamp(min, max) as i64)
            }
        }
    }

    fn read_sequence<S: Slots + ?Sized>(
        &mut self,
        slots: &S,
        position: usize,
        element: &SemanticType,
    ) -> Vec<Arg> {
        let mut out = Vec::new();
        for (_, value) in slots.entries(position) {
            let entry = [value];
            if !coercible_match(&entry[..], 1, element) {
                continue;
            }
            out.push(self.extract_unchecked(&entry[..], &mut Cursor::new(), element));
            if self.errors.is_set() {
                break;
            }
        }
        out
    }

    fn read_mapping<S: Slots + ?Sized>(
        &mut self,
        slots: &S,
        position: usize,
        key_type: &SemanticType,
        value_type: &SemanticType,
    ) -> ArgMap {
        let mut map = ArgMap::new();
        for (key, value) in slots.entries(position) {
            let pair = [key, value];
            if !coercible_match(&pair[..], 1, key_type)
                || !coercible_match(&pair[..], 2, value_type)
            {
                continue;
            }
            let key = self.extract_unchecked(&pair[..], &mut Cursor::at(1), key_type);
            let value = self.extract_unchecked(&pair[..], &mut Cursor::at(2), value_type);
            map.insert(key, value);
            if self.errors.is_set() {
                break;
            }
        }
        map
    }

    /// Value-level failure described by the slot's content
    fn fail_value<S: Slots + ?Sized>(&mut self, slots: &S, position: usize, ty: &SemanticType) {
        let names = TypeNames::new(self.registries);
        let got = names.describe_value(slots, position);
        self.fail(ErrorKind::ValueConstraintViolation, names.name_of(ty), &got);
    }

    fn fail(&mut self, kind: ErrorKind, expected: String, got: &str) {
        self.errors.set(ArgumentError::bad_argument(
            kind,
            self.function,
            expected,
            self.argument,
            got,
        ));
    }
}

/// Structural match that also requires numeric slots to coerce.
///
/// Used where a miss is silent: optional parameters and table entries.
fn coercible_match<S: Slots + ?Sized>(slots: &S, position: usize, ty: &SemanticType) -> bool {
    matcher::matches(slots, position, ty)
        && (!matches!(ty, SemanticType::Number(_)) || slots.read_number(position).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ClassTable, EnumTable, EnumTables};
    use crate::types::ClassId;
    use crate::value::{CallbackRef, RawHandle, Table, Value};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn registries() -> Registries {
        let classes = ClassTable::new();
        classes
            .declare("element", "element", None)
            .declare("vehicle", "vehicle", Some(ClassId::from("element")))
            .declare("ped", "ped", Some(ClassId::from("element")))
            .register_instance(RawHandle(1), "vehicle")
            .register_instance(RawHandle(2), "ped");
        let enums = EnumTables::new().with(
            "weather",
            EnumTable::new("weather-type").variant("sunny", 0).variant("rain", 1),
        );
        Registries::new(Arc::new(classes), Arc::new(enums))
    }

    fn extract_one(value: Value, ty: SemanticType) -> (Arg, Option<ArgumentError>, Cursor) {
        let registries = registries();
        let slots = [value];
        let mut extractor = Extractor::new("test", ExecutionContext(7), &registries);
        let mut cursor = Cursor::new();
        let arg = extractor.extract(&slots[..], &mut cursor, &ty);
        (arg, extractor.into_errors().into_error(), cursor)
    }

    #[test]
    fn test_integer_kinds_truncate_and_saturate() {
        let (arg, err, _) = extract_one(Value::from(-3.9), SemanticType::Number(NumberKind::I32));
        assert_eq!(arg, Arg::Integer(-3));
        assert!(err.is_none());

        let (arg, _, _) = extract_one(Value::from(70000.0), SemanticType::Number(NumberKind::U16));
        assert_eq!(arg, Arg::Integer(65535));

        let (arg, _, _) = extract_one(Value::from(-1.0), SemanticType::Number(NumberKind::U32));
        assert_eq!(arg, Arg::Integer(0));
    }

    #[test]
    fn test_numeric_string_is_parsed() {
        let (arg, err, cursor) = extract_one(Value::from(" 0x10 "), SemanticType::number());
        assert_eq!(arg, Arg::Float(OrderedFloat(16.0)));
        assert!(err.is_none());
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_non_numeric_string_is_value_violation() {
        let (arg, err, cursor) = extract_one(Value::from("abc"), SemanticType::number());
        let err = err.expect("error recorded");
        assert_eq!(arg, Arg::Float(OrderedFloat(0.0)));
        assert_eq!(err.kind, ErrorKind::ValueConstraintViolation);
        assert_eq!(
            err.message,
            "Bad argument @ 'test' [Expected number at argument 1, got string (\"abc\")]"
        );
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_nan_is_rejected() {
        let (_, err, cursor) =
            extract_one(Value::from(f64::NAN), SemanticType::Number(NumberKind::I16));
        let err = err.expect("error recorded");
        assert_eq!(err.kind, ErrorKind::ValueConstraintViolation);
        assert_eq!(
            err.message,
            "Bad argument @ 'test' [Expected number at argument 1, got NaN]"
        );
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_enum_lookup() {
        let (arg, err, _) = extract_one(Value::from("rain"), SemanticType::enumeration("weather"));
        assert_eq!(arg, Arg::Enum(1));
        assert!(err.is_none());

        let (arg, err, _) = extract_one(Value::from("snow"), SemanticType::enumeration("weather"));
        assert_eq!(arg, Arg::Enum(0));
        assert_eq!(
            err.map(|e| e.message),
            Some(
                "Bad argument @ 'test' [Expected weather-type at argument 1, got string (\"snow\")]"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_handle_downcast() {
        let (arg, err, _) =
            extract_one(Value::boxed(RawHandle(1)), SemanticType::handle("element"));
        assert_eq!(arg, Arg::Handle(Some(RawHandle(1))));
        assert!(err.is_none());

        let (arg, err, cursor) =
            extract_one(Value::LightUserData(RawHandle(2)), SemanticType::handle("vehicle"));
        assert_eq!(arg, Arg::Handle(None));
        assert_eq!(cursor.position(), 2);
        let err = err.expect("error recorded");
        assert_eq!(err.kind, ErrorKind::ValueConstraintViolation);
        assert_eq!(
            err.message,
            "Bad argument @ 'test' [Expected vehicle at argument 1, got ped]"
        );
    }

    #[test]
    fn test_structural_mismatch() {
        let (arg, err, cursor) = extract_one(Value::Nil, SemanticType::Boolean);
        assert_eq!(arg, Arg::Boolean(false));
        assert_eq!(cursor.position(), 1);
        let err = err.expect("error recorded");
        assert_eq!(err.kind, ErrorKind::StructuralTypeMismatch);
        assert_eq!(
            err.message,
            "Bad argument @ 'test' [Expected boolean at argument 1, got nil]"
        );
    }

    #[test]
    fn test_optional_miss_does_not_advance() {
        let (arg, err, cursor) =
            extract_one(Value::from("x"), SemanticType::optional(SemanticType::Boolean));
        assert_eq!(arg, Arg::Optional(None));
        assert!(err.is_none());
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_optional_number_skips_non_numeric_string() {
        let (arg, err, cursor) =
            extract_one(Value::from("b"), SemanticType::optional(SemanticType::number()));
        assert_eq!(arg, Arg::Optional(None));
        assert!(err.is_none());
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_callback_reference() {
        let (arg, err, cursor) =
            extract_one(Value::Function(CallbackRef(9)), SemanticType::Callback);
        assert_eq!(arg, Arg::Callback(Some(CallbackRef(9))));
        assert!(err.is_none());
        assert_eq!(cursor.position(), 2);

        let (arg, err, cursor) = extract_one(Value::from("onHit"), SemanticType::Callback);
        assert_eq!(arg, Arg::Callback(None));
        assert_eq!(cursor.position(), 1);
        assert_eq!(
            err.map(|e| e.message),
            Some(
                "Bad argument @ 'test' [Expected function at argument 1, got string (\"onHit\")]"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_context_never_consumes() {
        let (arg, err, cursor) = extract_one(Value::from(1.0), SemanticType::Context);
        assert_eq!(arg, Arg::Context(ExecutionContext(7)));
        assert!(err.is_none());
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_sequence_drops_non_matching_entries() {
        let table = Value::sequence(vec![
            Value::from(1.0),
            Value::Boolean(true),
            Value::from("x"),
            Value::from("4"),
        ]);
        let (arg, err, _) = extract_one(table, SemanticType::sequence(SemanticType::number()));
        assert!(err.is_none());
        assert_eq!(
            arg,
            Arg::Sequence(vec![
                Arg::Float(OrderedFloat(1.0)),
                Arg::Float(OrderedFloat(4.0))
            ])
        );
    }

    #[test]
    fn test_mapping_filters_and_last_write_wins() {
        let table = Value::Table(Table::from_pairs(vec![
            (Value::from("a"), Value::from(1.0)),
            (Value::from(2.0), Value::from(5.0)),
            (Value::from("b"), Value::Boolean(true)),
            (Value::from("2"), Value::from(9.0)),
        ]));
        let (arg, err, _) = extract_one(
            table,
            SemanticType::mapping(SemanticType::String, SemanticType::number()),
        );
        assert!(err.is_none());

        let mut expected = ArgMap::new();
        expected.insert(Arg::String("a".into()), Arg::Float(OrderedFloat(1.0)));
        expected.insert(Arg::String("2".into()), Arg::Float(OrderedFloat(9.0)));
        assert_eq!(arg, Arg::Mapping(expected));
    }

    #[test]
    fn test_large_mapping_with_duplicate_keys() {
        // "7" and 7 both coerce to the key 7.0
        let pairs = (0..40_000).map(|i| {
            let key = if (i / 1000) % 2 == 0 {
                Value::from((i % 1000) as f64)
            } else {
                Value::string((i % 1000).to_string())
            };
            (key, Value::from(i as f64))
        });
        let table = Value::Table(Table::from_pairs(pairs));
        let (arg, err, _) = extract_one(
            table,
            SemanticType::mapping(SemanticType::number(), SemanticType::number()),
        );
        assert!(err.is_none());

        let Arg::Mapping(map) = arg else {
            panic!("expected mapping, got {:?}", arg);
        };
        assert_eq!(map.len(), 1000);
        assert_eq!(
            map.get(&Arg::Float(OrderedFloat(7.0))),
            Some(&Arg::Float(OrderedFloat(39_007.0)))
        );
        assert_eq!(map.iter().next().map(|(k, _)| k), Some(&Arg::Float(OrderedFloat(0.0))));
    }

    #[test]
    fn test_union_picks_first_structural_match_even_if_it_fails() {
        let (arg, err, cursor) = extract_one(
            Value::from("hello"),
            SemanticType::union([SemanticType::number(), SemanticType::String]),
        );
        assert_eq!(
            arg,
            Arg::Union {
                index: 0,
                value: Box::new(Arg::Float(OrderedFloat(0.0)))
            }
        );
        assert_eq!(cursor.position(), 2);
        let err = err.expect("error recorded");
        assert_eq!(err.kind, ErrorKind::ValueConstraintViolation);
        assert_eq!(
            err.message,
            "Bad argument @ 'test' [Expected number at argument 1, got string (\"hello\")]"
        );
    }

    #[test]
    fn test_nested_failure_reports_enclosing_argument() {
        let registries = registries();
        let slots = [
            Value::from(1.0),
            Value::sequence(vec![Value::from("sunny"), Value::from("hail")]),
        ];
        let mut extractor = Extractor::new("setForecast", ExecutionContext::default(), &registries);
        let mut cursor = Cursor::new();
        extractor.extract(&slots[..], &mut cursor, &SemanticType::number());
        extractor.extract(
            &slots[..],
            &mut cursor,
            &SemanticType::sequence(SemanticType::enumeration("weather")),
        );

        let err = extractor.into_errors().into_error().expect("error recorded");
        assert_eq!(
            err.message,
            "Bad argument @ 'setForecast' [Expected weather-type at argument 2, got string (\"hail\")]"
        );
    }

    #[test]
    fn test_union_reports_winning_index() {
        let (arg, _, _) = extract_one(
            Value::Boolean(true),
            SemanticType::union([SemanticType::number(), SemanticType::Boolean]),
        );
        assert_eq!(
            arg,
            Arg::Union {
                index: 1,
                value: Box::new(Arg::Boolean(true))
            }
        );
    }
}
