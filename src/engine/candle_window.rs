use std::collections::VecDeque;

use crate::models::{Candle, Tick};

/// Default history bound, counting the in-progress candle
pub const MAX_CANDLES: usize = 10;

/// Bounded, most-recent-first window of candles
///
/// Index 0 is the in-progress candle and always reflects the latest tick
/// received; index 1 is the last fully closed candle and is never mutated
/// after closing. Oldest entries are evicted once the bound is reached.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Whether this tick starts a new interval relative to the current candle
    pub fn rolls(&self, tick: &Tick) -> bool {
        match self.candles.front() {
            Some(current) => current.time != tick.time,
            None => false,
        }
    }

    /// Overwrite the current candle in place with the tick's OHLCV,
    /// or seed the window on the very first tick
    pub fn update(&mut self, tick: &Tick) {
        match self.candles.front_mut() {
            Some(current) => *current = tick.clone(),
            None => self.candles.push_front(tick.clone()),
        }
    }

    /// Close the current candle into history and start a new one from the
    /// tick, evicting the oldest candle past capacity
    pub fn roll(&mut self, tick: &Tick) {
        self.candles.push_front(tick.clone());
        while self.candles.len() > self.capacity {
            self.candles.pop_back();
        }
    }

    /// Consume one tick; returns whether a candle boundary was crossed
    pub fn apply(&mut self, tick: &Tick) -> bool {
        let rolls = self.rolls(tick);
        if rolls {
            self.roll(tick);
        } else {
            self.update(tick);
        }
        rolls
    }

    /// The in-progress candle
    pub fn current(&self) -> Option<&Candle> {
        self.candles.front()
    }

    /// The most recent fully closed candle
    pub fn prev(&self) -> Option<&Candle> {
        self.candles.get(1)
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Most-recent-first iteration
    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }
}

impl Default for CandleWindow {
    fn default() -> Self {
        Self::new(MAX_CANDLES)
    }
}
