//! Dictionary Service - Core Library
//!
//! An in-memory word/definition store served over HTTP, persisted to a JSON
//! file at startup and shutdown.

pub mod cli;
pub mod connection;
pub mod dictionary;
pub mod error;
pub mod inspect;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod shutdown;
pub mod telemetry;

pub use dictionary::{Dictionary, Entry};
pub use error::{DictionaryError, ServerError};
