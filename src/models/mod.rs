use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of instrument traded on the venue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InstrumentKind {
    Spot,
    Margin,
    Futures,
}

/// Venue-resolved identity of the traded symbol
///
/// Immutable once fetched for a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub ticker: String,
    pub id: String,
    /// Number of units per lot
    pub lot: f64,
    /// Minimum price increment
    pub pip_size: f64,
    pub kind: InstrumentKind,
}

/// OHLCV aggregate over one fixed time interval
///
/// `time` is the interval-start timestamp assigned by the venue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A single incoming price observation. Venues stream partial-candle
/// updates carrying the interval timestamp, so a tick has candle shape.
pub type Tick = Candle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn invert(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

/// A proposed order, alive between intent and venue acknowledgment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrder {
    /// Correlation id, unique per proposal
    pub cid: Uuid,
    pub side: OrderSide,
    pub price: f64,
    pub lots: u64,
    pub instrument_id: String,
    /// True when this order closes an existing position
    pub close: bool,
    /// Venue id of the order being closed, for P&L attribution
    pub open_id: Option<String>,
    /// Entry price of the order being closed
    pub open_price: Option<f64>,
    pub time: DateTime<Utc>,
    /// Stamped when the order was placed during a learning replay
    pub learning: bool,
}

impl PendingOrder {
    /// Build an opening order proposal with a fresh correlation id
    pub fn open(
        side: OrderSide,
        price: f64,
        lots: u64,
        instrument_id: String,
        time: DateTime<Utc>,
        learning: bool,
    ) -> Self {
        Self {
            cid: Uuid::new_v4(),
            side,
            price,
            lots,
            instrument_id,
            close: false,
            open_id: None,
            open_price: None,
            time,
            learning,
        }
    }

    /// Build the closing proposal for an executed order: inverted side,
    /// executed lot count, original id and price carried for attribution
    pub fn close_for(order: &ExecutedOrder, price: f64, time: DateTime<Utc>) -> Self {
        Self {
            cid: Uuid::new_v4(),
            side: order.side.invert(),
            price,
            lots: order.executed_lots,
            instrument_id: order.instrument_id.clone(),
            close: true,
            open_id: Some(order.order_id.clone()),
            open_price: Some(order.price),
            time,
            learning: order.learning,
        }
    }
}

/// Mutual-exclusion state of an acknowledged order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderState {
    /// Acknowledged by the venue, position open
    Executed,
    /// A close attempt is in flight
    Closing,
}

/// A venue-acknowledged order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedOrder {
    pub cid: Uuid,
    /// Venue-assigned order id
    pub order_id: String,
    pub side: OrderSide,
    pub price: f64,
    pub lots: u64,
    pub executed_lots: u64,
    pub instrument_id: String,
    pub close: bool,
    pub open_id: Option<String>,
    pub open_price: Option<f64>,
    pub time: DateTime<Utc>,
    pub learning: bool,
    pub state: OrderState,
}

impl ExecutedOrder {
    /// Promote an acknowledged proposal
    pub fn from_pending(pending: PendingOrder, order_id: String, executed_lots: u64) -> Self {
        Self {
            cid: pending.cid,
            order_id,
            side: pending.side,
            price: pending.price,
            lots: pending.lots,
            executed_lots,
            instrument_id: pending.instrument_id,
            close: pending.close,
            open_id: pending.open_id,
            open_price: pending.open_price,
            time: pending.time,
            learning: pending.learning,
            state: OrderState::Executed,
        }
    }
}
