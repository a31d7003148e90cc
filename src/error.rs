use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine error taxonomy
///
/// `Config` is fatal and raised at construction. `Core` covers invariant
/// violations and order-submission failures; lifecycle operations log it
/// and continue rather than terminating the engine over one failed trade.
/// `Plugin` wraps failures from strategy/plugin code and always propagates.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("core error: {0}")]
    Core(String),

    #[error("history retrieval failed: {0}")]
    History(#[source] TransportError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("plugin error: {0}")]
    Plugin(#[from] anyhow::Error),
}
