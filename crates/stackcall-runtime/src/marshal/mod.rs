//! Argument marshalling: structural matching, value extraction, failure state

pub mod arg;
pub mod error;
pub mod extract;
pub mod matcher;

pub use arg::{Arg, ArgMap};
pub use error::{bad_argument_message, ArgumentError, ErrorKind, ErrorState, InvalidArgument};
pub use extract::{Cursor, Extractor};
pub use matcher::{match_union, matches};
