use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::InstrumentKind;

/// Per-strategy engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub ticker: String,
    pub currency: String,
    /// Candle interval in seconds
    pub interval_secs: u64,
    /// Equity allocated to the strategy, in `currency`
    pub amount: f64,
    /// Venue taker fee, percent
    pub fee: f64,
    /// Multiplier applied to the computed lot count
    pub lots_multiplier: f64,
    /// Fraction of `amount` actually deployed per order, (0, 1]
    pub equity_level: f64,
    pub margin: bool,
    pub instrument_kind: InstrumentKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            currency: "USDT".to_string(),
            interval_secs: 60,
            amount: 0.0,
            fee: 0.1,
            lots_multiplier: 1.0,
            equity_level: 1.0,
            margin: false,
            instrument_kind: InstrumentKind::Spot,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration. Called once at engine construction;
    /// every failure here is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.ticker.is_empty() {
            return Err(EngineError::Config("ticker must not be empty".to_string()));
        }
        if self.interval_secs == 0 {
            return Err(EngineError::Config(
                "interval must be at least one second".to_string(),
            ));
        }
        if self.amount <= 0.0 {
            return Err(EngineError::Config(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.fee < 0.0 {
            return Err(EngineError::Config(format!(
                "fee must not be negative, got {}",
                self.fee
            )));
        }
        if self.lots_multiplier <= 0.0 {
            return Err(EngineError::Config(format!(
                "lots multiplier must be positive, got {}",
                self.lots_multiplier
            )));
        }
        if self.equity_level <= 0.0 || self.equity_level > 1.0 {
            return Err(EngineError::Config(format!(
                "equity level must be in (0, 1], got {}",
                self.equity_level
            )));
        }
        if self.margin && self.instrument_kind == InstrumentKind::Spot {
            return Err(EngineError::Config(
                "margin trading requires a margin or futures instrument".to_string(),
            ));
        }
        Ok(())
    }
}
