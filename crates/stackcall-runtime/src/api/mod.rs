//! Public embedding API for stackcall
//!
//! This module provides the typed surface for exposing Rust functions to scripts:
//! - Binding construction with declared parameters and failure policy
//! - Conversion between Rust types and extracted arguments / frame values
//!
//! # Examples
//!
//! ```
//! use stackcall_runtime::api::BindingBuilder;
//! use stackcall_runtime::StackFrame;
//!
//! let greet = BindingBuilder::new("greet")
//!     .param_of::<String>()
//!     .with_implementation(|args| {
//!         let name: String = args.take()?;
//!         Ok(format!("hello {}", name))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let mut frame = StackFrame::new("greet", vec![]);
//! let err = greet.call(&mut frame).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Bad argument @ 'greet' [Expected string at argument 1, got none]"
//! );
//! ```

pub mod conversion;
pub mod native;

// Re-export main types for convenience
pub use conversion::{ConversionError, FromArg, IntoReturn, IntoValue, Param, Placeholder};
pub use native::{BindingBuilder, BuildError};
