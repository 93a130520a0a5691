//! Native function registration and builder
//!
//! `BindingBuilder` assembles a `Binding`: the function's name and declared
//! parameter types, its implementation, and how failed calls are reported.
//!
//! # Examples
//!
//! ```rust
//! use stackcall_runtime::api::native::BindingBuilder;
//! use stackcall_runtime::{FailurePolicy, StackFrame, Value};
//!
//! let clamp = BindingBuilder::new("clamp")
//!     .param_of::<f64>()
//!     .param_of::<Option<f64>>()
//!     .policy(FailurePolicy::SubstituteAndLog(Value::Boolean(false)))
//!     .with_implementation(|args| {
//!         let value: f64 = args.take()?;
//!         let max: Option<f64> = args.take()?;
//!         Ok(value.min(max.unwrap_or(1.0)))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let mut frame = StackFrame::new("clamp", vec![Value::from(3.0)]);
//! assert_eq!(clamp.call(&mut frame), Ok(1));
//! assert_eq!(frame.returns(), &[Value::Number(1.0)]);
//! ```

use super::conversion::{IntoReturn, Param};
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::dispatch::{Args, Binding, FailurePolicy, NativeFn, Signature};
use crate::marshal::InvalidArgument;
use crate::registry::Registries;
use crate::types::SemanticType;
use stackcall_config::Config;
use std::sync::Arc;
use thiserror::Error;

/// Builder for bindings
///
/// Parameters are declared in call order, either as explicit `SemanticType`s
/// (`param`) or derived from Rust types (`param_of`). Enum and handle parameters
/// need registry keys and are always declared explicitly.
pub struct BindingBuilder {
    name: String,
    params: Vec<SemanticType>,
    policy: FailurePolicy,
    sink: Option<Arc<dyn DiagnosticsSink>>,
    registries: Option<Registries>,
    implementation: Option<NativeFn>,
}

impl BindingBuilder {
    /// Create a builder for a function exposed to scripts as `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            policy: FailurePolicy::Raise,
            sink: None,
            registries: None,
            implementation: None,
        }
    }

    /// Declare the next parameter
    pub fn param(mut self, ty: SemanticType) -> Self {
        self.params.push(ty);
        self
    }

    /// Declare the next parameter from a Rust type
    pub fn param_of<T: Param>(self) -> Self {
        self.param(T::semantic_type())
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Take the failure policy configured for this function's name
    pub fn configured(mut self, config: &Config) -> Self {
        self.policy = FailurePolicy::from_config(&config.policy_for(&self.name));
        self
    }

    /// Where substituted failures are logged. Defaults to `TracingSink`.
    pub fn sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn registries(mut self, registries: Registries) -> Self {
        self.registries = Some(registries);
        self
    }

    /// Set the function implementation
    ///
    /// The closure reads its arguments with `Args::take` in declaration order. They
    /// have already been validated against the declared parameters when it runs.
    /// Returning `Err(InvalidArgument)` fails the call through the binding's policy.
    pub fn with_implementation<F, R>(mut self, implementation: F) -> Self
    where
        F: Fn(&mut Args<'_>) -> Result<R, InvalidArgument> + Send + Sync + 'static,
        R: IntoReturn,
    {
        self.implementation = Some(Arc::new(move |args: &mut Args<'_>| {
            implementation(args).map(IntoReturn::into_return)
        }));
        self
    }

    /// Build the binding
    ///
    /// # Errors
    ///
    /// * `BuildError::MissingImplementation` - no implementation was provided
    /// * `BuildError::EmptyUnion` - a union parameter has no alternatives
    pub fn build(self) -> Result<Binding, BuildError> {
        let implementation = self
            .implementation
            .ok_or_else(|| BuildError::MissingImplementation(self.name.clone()))?;

        if let Some(index) = self.params.iter().position(has_empty_union) {
            return Err(BuildError::EmptyUnion {
                name: self.name,
                param: index + 1,
            });
        }

        Ok(Binding::from_parts(
            Signature::with_params(self.name, self.params),
            implementation,
            self.policy,
            self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            self.registries.unwrap_or_default(),
        ))
    }
}

fn has_empty_union(ty: &SemanticType) -> bool {
    match ty {
        SemanticType::Union(alternatives) => {
            alternatives.is_empty() || alternatives.iter().any(has_empty_union)
        }
        SemanticType::Optional(inner) | SemanticType::Sequence(inner) => has_empty_union(inner),
        SemanticType::Mapping(key, value) => has_empty_union(key) || has_empty_union(value),
        _ => false,
    }
}

/// Errors that can occur when building a binding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Native function '{0}' missing implementation")]
    MissingImplementation(String),

    #[error("Native function '{name}' parameter {param} is a union with no alternatives")]
    EmptyUnion { name: String, param: usize },
}
