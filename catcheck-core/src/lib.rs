//! Core library for catcheck, the terminal client of the product-catalog AI checker.
//!
//! Everything that does not touch the terminal lives here: the change-markup
//! parser and renderer, suggestion extraction, the review session, the
//! analysis/result-card model, the typed backend client with its SSE stream,
//! and the ambient pieces (errors, config, logging, notifications).

pub mod analysis;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod markup;
pub mod notify;
pub mod render;
pub mod review;
pub mod sheet;
pub mod sse;
pub mod stream;
pub mod suggestion;

pub use error::{Error, Result};
