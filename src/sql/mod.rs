//! SQL text handling.
//!
//! The engine is the authority on SQL; this module only screens query text
//! before it is wrapped in an `EXPLAIN` statement.

mod error;
mod screen;

pub use error::{ScreenError, ScreenResult};
pub use screen::screen_query;
