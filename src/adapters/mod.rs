// Adapters layer: concrete implementations for external systems.

pub mod http;
pub mod mail;
pub mod recipients;
pub mod storage;
