use async_trait::async_trait;

use crate::engine::Engine;
use crate::error::Result;
use crate::models::{Candle, ExecutedOrder, Tick};

/// Extension points for the trading logic driven by the engine
///
/// The engine calls these at fixed moments of the tick cycle; the strategy
/// places and closes orders through the `engine` handle it receives.
/// Strategies should branch on [`Engine::is_learning`] when replaying
/// history, since the engine does not suppress order placement there.
#[async_trait]
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Called on every processed tick, after plugin tick hooks
    async fn on_tick(&mut self, _engine: &mut Engine, _tick: &Tick) -> Result<()> {
        Ok(())
    }

    /// Called once per closed candle, before the window rolls over
    async fn on_candle(&mut self, _engine: &mut Engine, _candle: &Candle) -> Result<()> {
        Ok(())
    }

    /// Called after an order was successfully closed at the venue
    async fn on_order_closed(
        &mut self,
        _engine: &mut Engine,
        _closed: &ExecutedOrder,
        _origin: &ExecutedOrder,
    ) -> Result<()> {
        Ok(())
    }
}
