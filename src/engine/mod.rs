pub mod candle_window;
pub mod order_book;
mod orders;

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::models::{Candle, ExecutedOrder, Instrument, Tick};
use crate::plugin::{GateHook, Hook, Plugin, PluginPipeline};
use crate::strategy::Strategy;
use crate::transport::{HistoryProvider, HistoryRequest, TickSubscription, Transport};

pub use candle_window::{CandleWindow, MAX_CANDLES};
pub use order_book::{BookOrder, OrderBook};

/// Composition root: owns the candle window and the order book, drives the
/// plugin pipeline and the strategy through the per-tick control flow
///
/// All asynchronous operations are awaited sequentially; the engine never
/// issues two overlapping operations against the same instance, which is
/// what keeps the non-atomic window/book mutations consistent.
pub struct Engine {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    history: Option<Arc<dyn HistoryProvider>>,
    plugins: PluginPipeline,
    candles: CandleWindow,
    book: OrderBook,
    instrument: Option<Instrument>,
    subscription: Option<TickSubscription>,
    learning: bool,
    // Successful closes waiting for strategy notification; drained at the
    // end of each tick cycle because the strategy holds the engine
    // mutably while it initiates closes
    closed_queue: Vec<(ExecutedOrder, ExecutedOrder)>,
}

impl Engine {
    /// Build an engine. Configuration problems are fatal and surface here.
    pub fn new(config: EngineConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            history: None,
            plugins: PluginPipeline::new(),
            candles: CandleWindow::default(),
            book: OrderBook::new(),
            instrument: None,
            subscription: None,
            learning: false,
            closed_queue: Vec::new(),
        })
    }

    /// Attach the historical data source used by [`learn`]
    ///
    /// [`learn`]: Engine::learn
    pub fn with_history(mut self, history: Arc<dyn HistoryProvider>) -> Self {
        self.history = Some(history);
        self
    }

    /// Register a plugin. Hooks run in registration order, never reordered.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.register(plugin);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn instrument(&self) -> Option<&Instrument> {
        self.instrument.as_ref()
    }

    /// The in-progress candle
    pub fn current_candle(&self) -> Option<&Candle> {
        self.candles.current()
    }

    /// The most recent fully closed candle
    pub fn prev_candle(&self) -> Option<&Candle> {
        self.candles.prev()
    }

    pub fn candles(&self) -> &CandleWindow {
        &self.candles
    }

    pub fn orders(&self) -> &OrderBook {
        &self.book
    }

    pub fn is_learning(&self) -> bool {
        self.learning
    }

    /// Run the start hooks, resolve the instrument and open the tick
    /// subscription
    pub async fn start(&mut self) -> Result<()> {
        self.plugins.emit(Hook::Start).await?;
        self.resolve_instrument().await?;
        let subscription = self.transport.subscribe_to_tick(&self.config).await?;
        self.subscription = Some(subscription);
        tracing::info!(ticker = %self.config.ticker, "Engine started");
        Ok(())
    }

    /// Drive the strategy from the live subscription until the stream ends
    pub async fn run(&mut self, strategy: &mut dyn Strategy) -> Result<()> {
        let mut subscription = self
            .subscription
            .take()
            .ok_or_else(|| EngineError::Core("engine not started".to_string()))?;

        while let Some(tick) = subscription.next().await {
            self.handle_tick(strategy, tick).await?;
        }
        tracing::info!("Tick stream ended");
        Ok(())
    }

    /// Per-tick control flow
    ///
    /// Boundary detection happens before the veto; the in-place candle
    /// update happens before the tick hooks so any order placed inside a
    /// hook sees the just-received price. On a boundary, candle hooks run
    /// against the closing candle while it is still at index 0, and the
    /// window rolls over only afterwards.
    pub async fn handle_tick(&mut self, strategy: &mut dyn Strategy, tick: Tick) -> Result<()> {
        let rolls = self.candles.rolls(&tick);

        if self.plugins.gate(GateHook::BeforeTick(&tick)).await? {
            tracing::debug!("Tick vetoed by plugin");
            return Ok(());
        }

        if !rolls {
            self.candles.update(&tick);
        }

        self.plugins.emit(Hook::Tick(&tick)).await?;
        strategy.on_tick(self, &tick).await?;

        if rolls {
            if let Some(closed) = self.candles.current().cloned() {
                self.plugins.emit(Hook::Candle(&closed)).await?;
                strategy.on_candle(self, &closed).await?;
                self.plugins.emit(Hook::AfterCandle(&closed)).await?;
            }
            self.candles.roll(&tick);
        }

        self.drain_closed(strategy).await
    }

    /// Replay historical candles through the identical tick handler with
    /// the learning flag set, priming plugin and strategy state
    pub async fn learn(&mut self, strategy: &mut dyn Strategy, days: u32) -> Result<()> {
        let provider = self
            .history
            .clone()
            .ok_or_else(|| EngineError::Core("no history provider configured".to_string()))?;

        self.resolve_instrument().await?;
        let instrument_id = self
            .instrument
            .as_ref()
            .map(|instrument| instrument.id.clone())
            .ok_or_else(|| EngineError::Core("instrument not resolved".to_string()))?;

        let candles = provider
            .history(&HistoryRequest {
                instrument_id,
                interval_secs: self.config.interval_secs,
                days,
            })
            .await
            .map_err(EngineError::History)?;

        tracing::info!("Learning from {} historical candles", candles.len());

        self.learning = true;
        let mut result = Ok(());
        for candle in candles {
            result = self.handle_tick(strategy, candle).await;
            if result.is_err() {
                break;
            }
        }
        self.learning = false;
        result
    }

    /// Shut down: close every open position, release the subscription,
    /// then run the dispose hooks. Honors in-flight closes.
    pub async fn dispose(&mut self, strategy: &mut dyn Strategy) -> Result<Vec<ExecutedOrder>> {
        let closed = self.close_all().await?;
        self.drain_closed(strategy).await?;
        // Dropping the receiver is the unsubscribe signal
        self.subscription = None;
        self.plugins.emit(Hook::Dispose).await?;
        tracing::info!("Engine disposed, {} orders closed", closed.len());
        Ok(closed)
    }

    async fn resolve_instrument(&mut self) -> Result<()> {
        if self.instrument.is_none() {
            let instrument = self.transport.instrument(&self.config).await?;
            tracing::info!(
                ticker = %instrument.ticker,
                id = %instrument.id,
                "Resolved instrument"
            );
            self.instrument = Some(instrument);
        }
        Ok(())
    }

    /// Deliver queued close notifications in close order. A notification
    /// handler may itself close orders; the loop keeps draining until the
    /// queue stays empty.
    async fn drain_closed(&mut self, strategy: &mut dyn Strategy) -> Result<()> {
        while !self.closed_queue.is_empty() {
            let events = std::mem::take(&mut self.closed_queue);
            for (closed, origin) in events {
                strategy.on_order_closed(self, &closed, &origin).await?;
            }
        }
        Ok(())
    }
}
