//! Infrastructure layer for the catalog client.
//!
//! Contains the adapters around the application layer: the TOML config
//! file, endpoint paths and an in-memory `BookApi`, logging setup, and the
//! UI command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `catalog_core`, but MUST NOT be imported by the `application` layer.

pub mod api_client;
pub mod config;
pub mod logging;
pub mod ui_bridge;
