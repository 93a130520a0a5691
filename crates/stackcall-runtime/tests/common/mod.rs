//! Shared helpers for stackcall runtime integration tests

#![allow(dead_code)]

use stackcall_runtime::frame::HandleRef;
use stackcall_runtime::value::SlotKind;
use stackcall_runtime::{
    CallFrame, CallbackRef, ClassId, ClassTable, EnumTable, EnumTables, ExecutionContext,
    RawHandle, Registries, ScriptString, Slots, StackFrame, Value,
};
use std::cell::RefCell;
use std::sync::Arc;

// Re-export testing utilities
pub use pretty_assertions::{assert_eq, assert_ne};

pub const VEHICLE: RawHandle = RawHandle(100);
pub const PED: RawHandle = RawHandle(200);

/// Registries with an element/vehicle/ped hierarchy and a weather enum
pub fn registries() -> Registries {
    let classes = ClassTable::new();
    classes
        .declare("element", "element", None)
        .declare("vehicle", "vehicle", Some(ClassId::from("element")))
        .declare("ped", "ped", Some(ClassId::from("element")))
        .register_instance(VEHICLE, "vehicle")
        .register_instance(PED, "ped");

    let enums = EnumTables::new().with(
        "weather",
        EnumTable::new("weather-type")
            .variant("sunny", 0)
            .variant("rain", 1)
            .variant("fog", 2),
    );

    Registries::new(Arc::new(classes), Arc::new(enums))
}

/// Call frame that records every slot position read through it
pub struct CountingFrame {
    inner: StackFrame,
    reads: RefCell<Vec<usize>>,
}

impl CountingFrame {
    pub fn new(function_name: &str, args: Vec<Value>) -> Self {
        Self {
            inner: StackFrame::new(function_name, args),
            reads: RefCell::new(Vec::new()),
        }
    }

    /// Positions read so far, in read order
    pub fn reads(&self) -> Vec<usize> {
        self.reads.borrow().clone()
    }

    pub fn returns(&self) -> &[Value] {
        self.inner.returns()
    }

    fn record(&self, position: usize) {
        self.reads.borrow_mut().push(position);
    }
}

impl Slots for CountingFrame {
    fn kind_at(&self, position: usize) -> SlotKind {
        self.record(position);
        self.inner.kind_at(position)
    }

    fn read_number(&self, position: usize) -> Option<f64> {
        self.record(position);
        self.inner.read_number(position)
    }

    fn read_string(&self, position: usize) -> Option<ScriptString> {
        self.record(position);
        self.inner.read_string(position)
    }

    fn read_boolean(&self, position: usize) -> bool {
        self.record(position);
        self.inner.read_boolean(position)
    }

    fn entries(&self, position: usize) -> Vec<(Value, Value)> {
        self.record(position);
        self.inner.entries(position)
    }

    fn read_handle(&self, position: usize) -> Option<HandleRef> {
        self.record(position);
        self.inner.read_handle(position)
    }

    fn read_callback(&self, position: usize) -> Option<CallbackRef> {
        self.record(position);
        self.inner.read_callback(position)
    }
}

impl CallFrame for CountingFrame {
    fn function_name(&self) -> &str {
        self.inner.function_name()
    }

    fn context(&self) -> ExecutionContext {
        self.inner.context()
    }

    fn push(&mut self, value: Value) {
        self.inner.push(value);
    }
}
