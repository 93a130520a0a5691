//! Bound native calls
//!
//! A `Binding` owns everything fixed at registration: the signature's descriptor
//! list, the native closure, the failure policy and the collaborators used for
//! diagnostics. `Binding::call` runs one invocation against a call frame:
//!
//! 1. extract one `Arg` per formal parameter, stopping at the first failure
//! 2. invoke the native closure with the extracted `Args`
//! 3. push the converted return value, or apply the failure policy
//!
//! Errors raised by the native closure (`InvalidArgument`) fold into the same
//! failure path as argument mismatches.

use crate::api::conversion::FromArg;
use crate::diagnostics::{DiagnosticsSink, FailureRecord};
use crate::frame::CallFrame;
use crate::marshal::{Arg, ArgumentError, Cursor, Extractor, InvalidArgument};
use crate::registry::Registries;
use crate::types::SemanticType;
use crate::value::Value;
use stackcall_config::{FallbackValue, ResolvedPolicy};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Native implementation of a binding
pub type NativeFn = Arc<dyn Fn(&mut Args<'_>) -> Result<Return, InvalidArgument> + Send + Sync>;

/// Function name plus ordered formal parameter types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: String,
    params: Vec<SemanticType>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(name: impl Into<String>, params: Vec<SemanticType>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn param(mut self, ty: SemanticType) -> Self {
        self.params.push(ty);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[SemanticType] {
        &self.params
    }
}

/// What a native function hands back to the frame
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Return {
    /// Unit return; nothing is pushed
    #[default]
    None,
    Value(Value),
    /// Multiple results, pushed in order
    Values(Vec<Value>),
}

/// How a binding reacts to a failed call
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FailurePolicy {
    /// Abort the call and surface the diagnostic to the interpreter
    #[default]
    Raise,
    /// Log the diagnostic and push the fallback as the call's single result
    SubstituteAndLog(Value),
}

impl FailurePolicy {
    pub fn from_config(policy: &ResolvedPolicy) -> Self {
        match policy {
            ResolvedPolicy::Raise => FailurePolicy::Raise,
            ResolvedPolicy::Log(fallback) => FailurePolicy::SubstituteAndLog(match fallback {
                FallbackValue::Boolean(b) => Value::Boolean(*b),
                FallbackValue::Number(n) => Value::Number(*n),
                FallbackValue::String(s) => Value::string(s),
            }),
        }
    }
}

/// Failure surfaced to the interpreter under the raise policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("{0}")]
    BadArgument(ArgumentError),
}

impl CallError {
    pub fn message(&self) -> &str {
        match self {
            CallError::BadArgument(err) => &err.message,
        }
    }
}

/// Extracted arguments handed to a native function, read in declaration order
#[derive(Debug)]
pub struct Args<'a> {
    function: &'a str,
    values: Vec<Arg>,
    next: usize,
}

impl<'a> Args<'a> {
    pub fn new(function: &'a str, values: Vec<Arg>) -> Self {
        Self {
            function,
            values,
            next: 0,
        }
    }

    pub fn function(&self) -> &str {
        self.function
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.values.get(index)
    }

    /// Convert the next parameter's value into `T`
    pub fn take<T: FromArg>(&mut self) -> Result<T, InvalidArgument> {
        let index = self.next;
        let arg = self
            .values
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, Arg::Placeholder))
            .ok_or_else(|| {
                InvalidArgument::new(format!(
                    "Bad argument @ '{}' [No parameter {}]",
                    self.function,
                    index + 1
                ))
            })?;
        self.next += 1;

        T::from_arg(arg).map_err(|err| {
            InvalidArgument::new(format!(
                "Bad argument @ '{}' [Parameter {}: {}]",
                self.function,
                index + 1,
                err
            ))
        })
    }

    /// A native-side rejection in the standard diagnostic format
    pub fn bad_argument(&self, expected: &str, argument: usize, got: &str) -> InvalidArgument {
        InvalidArgument(crate::marshal::bad_argument_message(
            self.function,
            expected,
            argument,
            got,
        ))
    }
}

/// A native function bound to its signature and failure policy
pub struct Binding {
    signature: Signature,
    native: NativeFn,
    policy: FailurePolicy,
    sink: Arc<dyn DiagnosticsSink>,
    registries: Registries,
}

impl Binding {
    pub(crate) fn from_parts(
        signature: Signature,
        native: NativeFn,
        policy: FailurePolicy,
        sink: Arc<dyn DiagnosticsSink>,
        registries: Registries,
    ) -> Self {
        Self {
            signature,
            native,
            policy,
            sink,
            registries,
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn policy(&self) -> &FailurePolicy {
        &self.policy
    }

    /// Run one call against `frame`. Returns the number of values pushed.
    pub fn call<F: CallFrame + ?Sized>(&self, frame: &mut F) -> Result<usize, CallError> {
        let function = match frame.function_name() {
            "" => self.signature.name(),
            name => name,
        };
        debug!(
            function = %function,
            params = self.signature.params().len(),
            "dispatching bound call"
        );

        match self.invoke(&*frame, function) {
            Ok(ret) => Ok(push_return(frame, ret)),
            Err(err) => {
                let record = FailureRecord::new(function, &err);
                match &self.policy {
                    FailurePolicy::Raise => {
                        debug!(kind = ?err.kind, "raising bad argument");
                        Err(CallError::BadArgument(err))
                    }
                    FailurePolicy::SubstituteAndLog(fallback) => {
                        self.sink.log(record);
                        frame.push(fallback.clone());
                        Ok(1)
                    }
                }
            }
        }
    }

    fn invoke<F: CallFrame + ?Sized>(
        &self,
        frame: &F,
        function: &str,
    ) -> Result<Return, ArgumentError> {
        let mut extractor = Extractor::new(function, frame.context(), &self.registries);
        let mut cursor = Cursor::new();
        let mut values = Vec::with_capacity(self.signature.params().len());

        for ty in self.signature.params() {
            values.push(extractor.extract(frame, &mut cursor, ty));
            if extractor.errors().is_set() {
                break;
            }
        }

        if let Some(err) = extractor.into_errors().into_error() {
            return Err(err);
        }

        let mut args = Args::new(function, values);
        (self.native)(&mut args).map_err(ArgumentError::from_native)
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("signature", &self.signature)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn push_return<F: CallFrame + ?Sized>(frame: &mut F, ret: Return) -> usize {
    match ret {
        Return::None => 0,
        Return::Value(value) => {
            frame.push(value);
            1
        }
        Return::Values(values) => {
            let count = values.len();
            for value in values {
                frame.push(value);
            }
            count
        }
    }
}
