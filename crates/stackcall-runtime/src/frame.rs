//! Call frame interface
//!
//! A call frame is the ordered, dynamically-tagged argument channel between the
//! interpreter and a native function. Positions are 1-based; position 0 is the
//! reserved implicit slot for the execution context.
//!
//! `Slots` is the read side used by matching and extraction. `CallFrame` adds the
//! function identity, the ambient context, and the return channel. Embedders
//! implement both over their interpreter; `StackFrame` is an owned implementation
//! used by tests and hosts that materialise arguments up front.

use crate::value::{BoxedHandle, CallbackRef, RawHandle, ScriptString, SlotKind, Value};

/// Position of the implicit execution-context slot
pub const CONTEXT_SLOT: usize = 0;

/// Identifies the interpreter state a call runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExecutionContext(pub u64);

/// A native object handle as found in a slot, in one of its two encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleRef {
    /// Lightweight handle stored directly in the slot
    Light(RawHandle),
    /// Boxed handle; needs one dereference
    Boxed(BoxedHandle),
}

impl HandleRef {
    pub fn resolve(&self) -> RawHandle {
        match self {
            HandleRef::Light(handle) => *handle,
            HandleRef::Boxed(boxed) => boxed.get(),
        }
    }
}

/// Read access to argument slots.
pub trait Slots {
    /// Kind of the slot at `position`; `SlotKind::None` past the end
    fn kind_at(&self, position: usize) -> SlotKind;

    /// Number at `position`, coercing numeric strings
    fn read_number(&self, position: usize) -> Option<f64>;

    /// String at `position`, coercing numbers
    fn read_string(&self, position: usize) -> Option<ScriptString>;

    fn read_boolean(&self, position: usize) -> bool;

    /// Entries of the table at `position`, in the table's enumeration order
    fn entries(&self, position: usize) -> Vec<(Value, Value)>;

    fn read_handle(&self, position: usize) -> Option<HandleRef>;

    /// Function reference at `position`
    fn read_callback(&self, position: usize) -> Option<CallbackRef>;
}

/// A full call frame: arguments plus function identity and return channel.
pub trait CallFrame: Slots {
    /// Display name attached to the bound function at registration
    fn function_name(&self) -> &str;

    /// The ambient interpreter context of this call
    fn context(&self) -> ExecutionContext;

    /// Push a return value
    fn push(&mut self, value: Value);
}

impl Slots for [Value] {
    fn kind_at(&self, position: usize) -> SlotKind {
        slot(self, position).map_or(SlotKind::None, Value::kind)
    }

    fn read_number(&self, position: usize) -> Option<f64> {
        slot(self, position).and_then(Value::to_number)
    }

    fn read_string(&self, position: usize) -> Option<ScriptString> {
        slot(self, position).and_then(Value::to_script_string)
    }

    fn read_boolean(&self, position: usize) -> bool {
        slot(self, position).is_some_and(Value::truthy)
    }

    fn entries(&self, position: usize) -> Vec<(Value, Value)> {
        match slot(self, position) {
            Some(Value::Table(table)) => table.entries().to_vec(),
            _ => Vec::new(),
        }
    }

    fn read_handle(&self, position: usize) -> Option<HandleRef> {
        match slot(self, position)? {
            Value::LightUserData(handle) => Some(HandleRef::Light(*handle)),
            Value::UserData(boxed) => Some(HandleRef::Boxed(boxed.clone())),
            _ => None,
        }
    }

    fn read_callback(&self, position: usize) -> Option<CallbackRef> {
        match slot(self, position)? {
            Value::Function(callback) => Some(*callback),
            _ => None,
        }
    }
}

fn slot(values: &[Value], position: usize) -> Option<&Value> {
    if position == CONTEXT_SLOT {
        return None;
    }
    values.get(position - 1)
}

/// Owned call frame
#[derive(Debug, Clone, Default)]
pub struct StackFrame {
    function_name: String,
    context: ExecutionContext,
    args: Vec<Value>,
    returns: Vec<Value>,
}

impl StackFrame {
    pub fn new(function_name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            function_name: function_name.into(),
            context: ExecutionContext::default(),
            args,
            returns: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Values pushed by the call, in push order
    pub fn returns(&self) -> &[Value] {
        &self.returns
    }

    pub fn into_returns(self) -> Vec<Value> {
        self.returns
    }
}

impl Slots for StackFrame {
    fn kind_at(&self, position: usize) -> SlotKind {
        self.args.kind_at(position)
    }

    fn read_number(&self, position: usize) -> Option<f64> {
        self.args.read_number(position)
    }

    fn read_string(&self, position: usize) -> Option<ScriptString> {
        self.args.read_string(position)
    }

    fn read_boolean(&self, position: usize) -> bool {
        self.args.read_boolean(position)
    }

    fn entries(&self, position: usize) -> Vec<(Value, Value)> {
        self.args.entries(position)
    }

    fn read_handle(&self, position: usize) -> Option<HandleRef> {
        self.args.read_handle(position)
    }

    fn read_callback(&self, position: usize) -> Option<CallbackRef> {
        self.args.read_callback(position)
    }
}

impl CallFrame for StackFrame {
    fn function_name(&self) -> &str {
        &self.function_name
    }

    fn context(&self) -> ExecutionContext {
        self.context
    }

    fn push(&mut self, value: Value) {
        self.returns.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Table;

    #[test]
    fn test_positions_are_one_based() {
        let frame = StackFrame::new("f", vec![Value::from(1.0), Value::from("a")]);
        assert_eq!(frame.kind_at(CONTEXT_SLOT), SlotKind::None);
        assert_eq!(frame.kind_at(1), SlotKind::Number);
        assert_eq!(frame.kind_at(2), SlotKind::String);
        assert_eq!(frame.kind_at(3), SlotKind::None);
    }

    #[test]
    fn test_absent_and_nil_are_distinct() {
        let frame = StackFrame::new("f", vec![Value::Nil]);
        assert_eq!(frame.kind_at(1), SlotKind::Nil);
        assert_eq!(frame.kind_at(2), SlotKind::None);
    }

    #[test]
    fn test_read_handle_encodings() {
        let frame = StackFrame::new(
            "f",
            vec![
                Value::LightUserData(RawHandle(3)),
                Value::boxed(RawHandle(4)),
            ],
        );
        assert_eq!(frame.read_handle(1).map(|h| h.resolve()), Some(RawHandle(3)));
        assert!(matches!(frame.read_handle(2), Some(HandleRef::Boxed(_))));
        assert_eq!(frame.read_handle(2).map(|h| h.resolve()), Some(RawHandle(4)));
    }

    #[test]
    fn test_entries_of_non_table_are_empty() {
        let table = Table::sequence(vec![Value::from(1.0)]);
        let frame = StackFrame::new("f", vec![Value::Table(table), Value::from(2.0)]);
        assert_eq!(frame.entries(1).len(), 1);
        assert!(frame.entries(2).is_empty());
    }

    #[test]
    fn test_push_collects_returns() {
        let mut frame = StackFrame::new("f", vec![]);
        frame.push(Value::Boolean(true));
        assert_eq!(frame.returns(), &[Value::Boolean(true)]);
    }
}
