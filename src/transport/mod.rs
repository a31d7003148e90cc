// Venue-facing interfaces. The engine depends on these traits only;
// concrete broker connectors live outside this crate.
pub mod paper;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::models::{Candle, ExecutedOrder, Instrument, InstrumentKind, PendingOrder, Tick};

pub use paper::PaperTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("order rejected by venue: {0}")]
    Rejected(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("unsupported instrument kind {0:?} for this venue")]
    UnsupportedKind(InstrumentKind),
}

/// Live tick stream for one instrument
///
/// Dropping the subscription closes the channel, which is the unsubscribe
/// signal to the transport.
pub struct TickSubscription {
    pub ticks: mpsc::Receiver<Tick>,
}

impl TickSubscription {
    pub async fn next(&mut self) -> Option<Tick> {
        self.ticks.recv().await
    }
}

/// Broker/venue contract consumed by the engine
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolve the traded instrument for the session
    async fn instrument(&self, config: &EngineConfig) -> Result<Instrument, TransportError>;

    /// Open a live tick stream
    async fn subscribe_to_tick(
        &self,
        config: &EngineConfig,
    ) -> Result<TickSubscription, TransportError>;

    /// Submit an order. Fails on venue rejection or network error.
    async fn place_order(
        &self,
        order: &PendingOrder,
        config: &EngineConfig,
    ) -> Result<ExecutedOrder, TransportError>;

    /// Normalize a raw lot count to what the venue accepts
    fn prepare_lots(&self, lots: f64, instrument_id: &str) -> Result<u64, TransportError>;
}

/// Parameters for a historical candle fetch
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub instrument_id: String,
    pub interval_secs: u64,
    pub days: u32,
}

/// Historical data source used to warm up a strategy before going live
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetch candles covering the requested span, oldest first
    async fn history(&self, request: &HistoryRequest) -> Result<Vec<Candle>, TransportError>;
}
