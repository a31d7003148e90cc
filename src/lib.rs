// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod plugin;
pub mod strategy;
pub mod transport;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{CandleWindow, Engine, OrderBook};
pub use error::{EngineError, Result};
pub use models::*;
pub use plugin::{Plugin, PluginPipeline};
pub use strategy::Strategy;
pub use transport::{HistoryProvider, Transport, TransportError};
