//! stackcall runtime - argument marshalling between scripts and native code
//!
//! This library binds statically-typed Rust functions to a dynamically-typed,
//! stack-based calling convention:
//! - Structural matching of call frame slots against declared parameter types
//! - Extraction of primitive and compound arguments (optional, sequence, mapping, union)
//! - Precise "Bad argument" diagnostics with a sticky first-failure record
//! - Raise or substitute-and-log failure policies per binding

/// stackcall runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod api;
pub mod diagnostics;
pub mod dispatch;
pub mod frame;
pub mod logging;
pub mod marshal;
pub mod registry;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use api::{BindingBuilder, BuildError, FromArg, IntoReturn, IntoValue, Param};
pub use diagnostics::{DiagnosticsSink, MemorySink, NullSink, TerminalSink, TracingSink};
pub use dispatch::{Args, Binding, CallError, FailurePolicy, Return, Signature};
pub use frame::{CallFrame, ExecutionContext, HandleRef, Slots, StackFrame};
pub use logging::init_logging;
pub use marshal::{Arg, ArgMap, ArgumentError, ErrorKind, InvalidArgument};
pub use registry::{ClassRegistry, ClassTable, EnumRegistry, EnumTable, EnumTables, Registries};
pub use types::{ClassId, EnumId, NumberKind, SemanticType, TypeNames};
pub use value::{CallbackRef, RawHandle, ScriptString, Table, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        assert_eq!(VERSION, "0.1.0");
    }
}
