#![deny(unused_variables)]

//! Shared domain layer: types, error taxonomy, layered config, the embedder
//! and completer seams, and document ingestion.

pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
