//! # duel-error
//!
//! Unified error handling for the duel interview simulator.
//!
//! ## Design
//!
//! - **ErrorKind**: what went wrong (e.g. `RateLimited`, `ConfigInvalid`)
//! - **ErrorStatus**: Permanent or Temporary, shown in every rendering
//! - **Context**: the operation plus key/value pairs that locate the cause
//! - **Source**: the underlying error, wrapped without leaking its type
//!
//! ## Usage
//!
//! ```rust
//! use duel_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ModelNotFound, "model is not served by the router")
//!         .with_operation("inference::complete")
//!         .with_context("model", "mistralai/Mistral-7B-Instruct-v0.2"))
//! }
//! ```
//!
//! ## Principles
//!
//! - Library functions return `Result<T, duel_error::Error>`
//! - External errors are attached with `set_source(err)`
//! - An error is handled once; callers further up only append context

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the duel Error
pub type Result<T> = std::result::Result<T, Error>;
