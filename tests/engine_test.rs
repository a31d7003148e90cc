use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tickbot::transport::{HistoryProvider, HistoryRequest, PaperTransport, TransportError};
use tickbot::{
    Candle, Engine, EngineConfig, ExecutedOrder, OrderSide, PendingOrder, Plugin, Result,
    Strategy, Tick,
};

fn tick_at(secs: i64, close: f64) -> Tick {
    Tick {
        time: Utc.timestamp_opt(secs, 0).unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume: 500.0,
    }
}

fn config() -> EngineConfig {
    EngineConfig {
        ticker: "SOLUSDT".to_string(),
        amount: 1000.0,
        interval_secs: 60,
        ..Default::default()
    }
}

/// Counts lifecycle hook invocations
#[derive(Default)]
struct HookCounter {
    starts: Arc<Mutex<u32>>,
    opens: Arc<Mutex<u32>>,
    closes: Arc<Mutex<u32>>,
    candles: Arc<Mutex<u32>>,
    disposes: Arc<Mutex<u32>>,
}

impl HookCounter {
    fn plugin(&self) -> Box<dyn Plugin> {
        Box::new(CounterPlugin {
            starts: self.starts.clone(),
            opens: self.opens.clone(),
            closes: self.closes.clone(),
            candles: self.candles.clone(),
            disposes: self.disposes.clone(),
        })
    }
}

struct CounterPlugin {
    starts: Arc<Mutex<u32>>,
    opens: Arc<Mutex<u32>>,
    closes: Arc<Mutex<u32>>,
    candles: Arc<Mutex<u32>>,
    disposes: Arc<Mutex<u32>>,
}

#[async_trait]
impl Plugin for CounterPlugin {
    fn name(&self) -> &str {
        "hook-counter"
    }

    async fn on_start(&mut self) -> anyhow::Result<()> {
        *self.starts.lock().unwrap() += 1;
        Ok(())
    }

    async fn on_candle(&mut self, _candle: &Candle) -> anyhow::Result<()> {
        *self.candles.lock().unwrap() += 1;
        Ok(())
    }

    async fn on_open(&mut self, _order: &ExecutedOrder) -> anyhow::Result<()> {
        *self.opens.lock().unwrap() += 1;
        Ok(())
    }

    async fn on_close(
        &mut self,
        _closed: &ExecutedOrder,
        _origin: &ExecutedOrder,
    ) -> anyhow::Result<()> {
        *self.closes.lock().unwrap() += 1;
        Ok(())
    }

    async fn on_dispose(&mut self) -> anyhow::Result<()> {
        *self.disposes.lock().unwrap() += 1;
        Ok(())
    }
}

/// Buys on strong candles, exits on weak ones; skips the learning replay
struct ThresholdStrategy {
    buy_above: f64,
    sell_below: f64,
    learned_candles: u32,
    closed_notifications: Vec<(String, f64)>,
}

impl ThresholdStrategy {
    fn new(buy_above: f64, sell_below: f64) -> Self {
        Self {
            buy_above,
            sell_below,
            learned_candles: 0,
            closed_notifications: Vec::new(),
        }
    }
}

#[async_trait]
impl Strategy for ThresholdStrategy {
    fn name(&self) -> &str {
        "threshold"
    }

    async fn on_candle(&mut self, engine: &mut Engine, candle: &Candle) -> Result<()> {
        if engine.is_learning() {
            self.learned_candles += 1;
            return Ok(());
        }

        if candle.close >= self.buy_above && engine.orders().is_empty() {
            engine.create_order(OrderSide::Buy).await?;
        } else if candle.close <= self.sell_below {
            engine.close_all().await?;
        }
        Ok(())
    }

    async fn on_order_closed(
        &mut self,
        _engine: &mut Engine,
        closed: &ExecutedOrder,
        origin: &ExecutedOrder,
    ) -> Result<()> {
        self.closed_notifications
            .push((origin.order_id.clone(), closed.price));
        Ok(())
    }
}

struct ReplayHistory {
    candles: Vec<Candle>,
}

#[async_trait]
impl HistoryProvider for ReplayHistory {
    async fn history(&self, _request: &HistoryRequest) -> std::result::Result<Vec<Candle>, TransportError> {
        Ok(self.candles.clone())
    }
}

#[tokio::test]
async fn test_full_engine_lifecycle() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(PaperTransport::new());
    let history = ReplayHistory {
        candles: vec![tick_at(-180, 98.0), tick_at(-120, 99.0), tick_at(-60, 100.0)],
    };

    let mut engine = Engine::new(config(), transport.clone())
        .unwrap()
        .with_history(Arc::new(history));
    let counter = HookCounter::default();
    engine.register(counter.plugin());
    let mut strategy = ThresholdStrategy::new(105.0, 95.0);

    // 1. Warm up from history; the strategy branches on the learning flag
    engine.learn(&mut strategy, 1).await.unwrap();
    assert_eq!(strategy.learned_candles, 2);
    assert!(engine.orders().is_empty());

    // 2. Go live
    engine.start().await.unwrap();
    assert_eq!(*counter.starts.lock().unwrap(), 1);
    assert!(engine.instrument().is_some());

    // 3. Feed a buy-then-exit price path and drain it
    for tick in [
        tick_at(0, 100.0),
        tick_at(60, 106.0),
        tick_at(120, 94.0),
        tick_at(180, 100.0),
        tick_at(240, 100.0),
    ] {
        assert!(transport.push_tick(tick).await);
    }
    transport.disconnect();
    engine.run(&mut strategy).await.unwrap();

    // The 106 candle triggered the buy, the 94 candle the exit
    assert!(engine.orders().is_empty());
    assert_eq!(*counter.opens.lock().unwrap(), 1);
    assert_eq!(*counter.closes.lock().unwrap(), 1);
    assert_eq!(strategy.closed_notifications.len(), 1);
    assert_eq!(strategy.closed_notifications[0].1, 94.0);

    // Candle window: live candles only roll on boundaries
    assert!(engine.candles().len() <= 10);
    assert_eq!(engine.current_candle().unwrap().close, 100.0);
    assert_eq!(engine.prev_candle().unwrap().close, 100.0);

    // 4. Shut down with nothing left open
    let closed = engine.dispose(&mut strategy).await.unwrap();
    assert!(closed.is_empty());
    assert_eq!(*counter.disposes.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_dispose_closes_open_positions() {
    let _ = tracing_subscriber::fmt::try_init();

    let transport = Arc::new(PaperTransport::new());
    let mut engine = Engine::new(config(), transport.clone()).unwrap();
    let counter = HookCounter::default();
    engine.register(counter.plugin());
    // Buys and never exits on its own
    let mut strategy = ThresholdStrategy::new(105.0, 0.0);

    engine.start().await.unwrap();

    for tick in [tick_at(0, 100.0), tick_at(60, 110.0), tick_at(120, 111.0)] {
        assert!(transport.push_tick(tick).await);
    }
    transport.disconnect();
    engine.run(&mut strategy).await.unwrap();

    assert_eq!(engine.orders().len(), 1);

    let closed = engine.dispose(&mut strategy).await.unwrap();

    assert_eq!(closed.len(), 1);
    assert!(engine.orders().is_empty());
    assert_eq!(*counter.closes.lock().unwrap(), 1);
    assert_eq!(strategy.closed_notifications.len(), 1);
}

#[tokio::test]
async fn test_rejected_open_returns_nothing() {
    let _ = tracing_subscriber::fmt::try_init();

    // Tiny equity: lot preparation floors the raw count to zero and the
    // open is abandoned before any submission
    let transport = Arc::new(PaperTransport::new());
    let tiny = EngineConfig {
        amount: 5.0,
        ..config()
    };
    let mut engine = Engine::new(tiny, transport.clone()).unwrap();
    let mut strategy = ThresholdStrategy::new(0.0, -1.0);

    engine.start().await.unwrap();
    assert!(transport.push_tick(tick_at(0, 100.0)).await);
    assert!(transport.push_tick(tick_at(60, 100.0)).await);
    transport.disconnect();
    engine.run(&mut strategy).await.unwrap();

    assert!(engine.orders().is_empty());
}

#[tokio::test]
async fn test_veto_plugin_gates_orders() {
    let _ = tracing_subscriber::fmt::try_init();

    struct OpenVeto;

    #[async_trait]
    impl Plugin for OpenVeto {
        fn name(&self) -> &str {
            "open-veto"
        }

        async fn on_before_open(&mut self, _order: &PendingOrder) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    let transport = Arc::new(PaperTransport::new());
    let mut engine = Engine::new(config(), transport.clone()).unwrap();
    let counter = HookCounter::default();
    engine.register(Box::new(OpenVeto));
    engine.register(counter.plugin());
    let mut strategy = ThresholdStrategy::new(0.0, -1.0);

    engine.start().await.unwrap();
    assert!(transport.push_tick(tick_at(0, 100.0)).await);
    assert!(transport.push_tick(tick_at(60, 100.0)).await);
    transport.disconnect();
    engine.run(&mut strategy).await.unwrap();

    // Every open was vetoed before reaching the book or the venue
    assert!(engine.orders().is_empty());
    assert_eq!(*counter.opens.lock().unwrap(), 0);
}
