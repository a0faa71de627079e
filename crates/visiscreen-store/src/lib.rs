//! visiscreen-store: configuration and screening record stores.
//!
//! Implements the `RecordStore` trait over a local directory, a REST JSON
//! document API, and memory, plus the `visiscreen.toml` configuration that
//! selects between them.

pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod memory;

pub use config::{create_store, load_config, load_config_from, StoreConfig, VisiscreenConfig};
pub use error::StoreError;
