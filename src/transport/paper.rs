use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::models::{ExecutedOrder, Instrument, PendingOrder, Tick};
use crate::transport::{TickSubscription, Transport, TransportError};

/// In-memory venue that fills every order at the requested price
///
/// Used for sandbox runs and tests: ticks are fed through [`push_tick`]
/// and order ids increase monotonically.
///
/// [`push_tick`]: PaperTransport::push_tick
pub struct PaperTransport {
    inner: Mutex<Inner>,
}

struct Inner {
    next_order_id: u64,
    tick_tx: Option<mpsc::Sender<Tick>>,
}

impl PaperTransport {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_order_id: 1,
                tick_tx: None,
            }),
        }
    }

    /// Feed one tick into the active subscription
    ///
    /// Returns false when there is no subscriber (never subscribed, or the
    /// subscription was dropped).
    pub async fn push_tick(&self, tick: Tick) -> bool {
        let tx = self.inner.lock().unwrap().tick_tx.clone();
        match tx {
            Some(tx) => tx.send(tick).await.is_ok(),
            None => false,
        }
    }

    /// End the tick stream; a running engine loop terminates after the
    /// buffered ticks are drained
    pub fn disconnect(&self) {
        self.inner.lock().unwrap().tick_tx = None;
    }
}

impl Default for PaperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for PaperTransport {
    async fn instrument(&self, config: &EngineConfig) -> Result<Instrument, TransportError> {
        Ok(Instrument {
            ticker: config.ticker.clone(),
            id: config.ticker.clone(),
            lot: 1.0,
            pip_size: 0.01,
            kind: config.instrument_kind,
        })
    }

    async fn subscribe_to_tick(
        &self,
        _config: &EngineConfig,
    ) -> Result<TickSubscription, TransportError> {
        let (tx, rx) = mpsc::channel(256);
        self.inner.lock().unwrap().tick_tx = Some(tx);
        Ok(TickSubscription { ticks: rx })
    }

    async fn place_order(
        &self,
        order: &PendingOrder,
        _config: &EngineConfig,
    ) -> Result<ExecutedOrder, TransportError> {
        if order.lots == 0 {
            return Err(TransportError::Rejected("zero lot order".to_string()));
        }

        let order_id = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_order_id;
            inner.next_order_id += 1;
            id
        };

        tracing::debug!(
            cid = %order.cid,
            order_id,
            "Paper fill @ {:.4} x{}",
            order.price,
            order.lots
        );

        Ok(ExecutedOrder::from_pending(
            order.clone(),
            order_id.to_string(),
            order.lots,
        ))
    }

    fn prepare_lots(&self, lots: f64, _instrument_id: &str) -> Result<u64, TransportError> {
        Ok(lots.floor().max(0.0) as u64)
    }
}
