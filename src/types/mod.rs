pub mod error;

pub use error::{ErrorCategory, ErrorClassifier, Result, TrailerError};
