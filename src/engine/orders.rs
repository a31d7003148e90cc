//! Order lifecycle operations.
//!
//! States: Proposed -> Pending -> Executed -> Closing -> Closed, with the
//! failure exits Proposed -> Rejected and Closing -> Executed (rollback).
//! A position must be Executed before it can be closed. Submission
//! failures are logged as core errors and resolved by compensating state
//! rollback; callers see `None` instead of a half-applied book.

use uuid::Uuid;

use crate::engine::order_book::BookOrder;
use crate::engine::Engine;
use crate::error::Result;
use crate::models::{ExecutedOrder, OrderSide, OrderState, PendingOrder};
use crate::plugin::{GateHook, Hook};

impl Engine {
    /// Open a position at the current candle's close price
    ///
    /// Returns `None` when the open was vetoed by a plugin or rejected by
    /// the venue; no retry is attempted and the book is left exactly as it
    /// was before the call.
    pub async fn create_order(&mut self, side: OrderSide) -> Result<Option<ExecutedOrder>> {
        let Some(instrument_id) = self.instrument.as_ref().map(|i| i.id.clone()) else {
            tracing::error!("create_order before instrument resolution");
            return Ok(None);
        };
        let Some((price, time)) = self.candles.current().map(|c| (c.close, c.time)) else {
            tracing::error!("create_order without market data");
            return Ok(None);
        };

        let raw_lots =
            self.config.amount * self.config.equity_level / price * self.config.lots_multiplier;
        let lots = match self.transport.prepare_lots(raw_lots, &instrument_id) {
            Ok(lots) => lots,
            Err(err) => {
                tracing::error!("Lot preparation failed: {err}");
                return Ok(None);
            }
        };
        if lots == 0 {
            tracing::warn!(
                "Order of {raw_lots} raw lots normalizes to zero, nothing to submit"
            );
            return Ok(None);
        }

        let pending = PendingOrder::open(side, price, lots, instrument_id, time, self.learning);

        if self.plugins.gate(GateHook::BeforeOpen(&pending)).await? {
            tracing::debug!(cid = %pending.cid, "Open vetoed by plugin");
            return Ok(None);
        }

        // Optimistic insert, rolled back on rejection
        self.book.push(BookOrder::Pending(pending.clone()));

        match self.transport.place_order(&pending, &self.config).await {
            Ok(executed) => {
                if let Err(err) = self.book.replace(pending.cid, executed.clone()) {
                    tracing::error!("{err}");
                    self.book.insert_front(BookOrder::Executed(executed.clone()));
                }
                self.plugins.emit(Hook::Open(&executed)).await?;
                tracing::info!(
                    cid = %executed.cid,
                    order_id = %executed.order_id,
                    "Opened {:?} {} x{} @ {:.4}",
                    executed.side,
                    executed.instrument_id,
                    executed.executed_lots,
                    executed.price
                );
                Ok(Some(executed))
            }
            Err(err) => {
                tracing::error!(cid = %pending.cid, "Order submission failed: {err}");
                self.book.remove(pending.cid);
                Ok(None)
            }
        }
    }

    /// Close the order identified by its correlation id
    ///
    /// No-ops (returning `None`) when the order was never executed or a
    /// close is already in flight. A venue failure reinserts the position
    /// at the front of the book so it is never silently lost.
    pub async fn close_order(&mut self, cid: Uuid) -> Result<Option<ExecutedOrder>> {
        let original = match self.book.get(cid) {
            None => {
                tracing::debug!(%cid, "Close requested for unknown order");
                return Ok(None);
            }
            Some(BookOrder::Pending(_)) => {
                tracing::debug!(%cid, "Close requested for an order never executed");
                return Ok(None);
            }
            Some(BookOrder::Executed(order)) if order.state == OrderState::Closing => {
                tracing::debug!(%cid, "Close already in flight");
                return Ok(None);
            }
            Some(BookOrder::Executed(order)) => order.clone(),
        };

        // Re-entrancy guard, held for the duration of the operation
        self.set_order_state(cid, OrderState::Closing);

        let (price, time) = self
            .candles
            .current()
            .map(|c| (c.close, c.time))
            .unwrap_or((original.price, original.time));
        let closing = PendingOrder::close_for(&original, price, time);

        let vetoed = match self
            .plugins
            .gate(GateHook::BeforeClose(&closing, &original))
            .await
        {
            Ok(vetoed) => vetoed,
            Err(err) => {
                self.set_order_state(cid, OrderState::Executed);
                return Err(err);
            }
        };
        if vetoed {
            tracing::debug!(%cid, "Close vetoed by plugin");
            self.set_order_state(cid, OrderState::Executed);
            return Ok(None);
        }

        // Optimistic removal, compensated on failure
        self.book.remove(cid);

        match self.transport.place_order(&closing, &self.config).await {
            Ok(closed) => {
                self.plugins.emit(Hook::Close(&closed, &original)).await?;
                tracing::info!(
                    cid = %original.cid,
                    order_id = %original.order_id,
                    "Closed {:?} {} x{} @ {:.4}",
                    original.side,
                    original.instrument_id,
                    original.executed_lots,
                    closed.price
                );
                self.closed_queue.push((closed.clone(), original));
                Ok(Some(closed))
            }
            Err(err) => {
                tracing::error!(cid = %original.cid, "Close submission failed: {err}");
                if !self.book.contains(cid) {
                    let mut restored = original;
                    restored.state = OrderState::Executed;
                    self.book.insert_front(BookOrder::Executed(restored));
                }
                Ok(None)
            }
        }
    }

    /// Close every open order sequentially
    ///
    /// The order list is snapshotted first because closing mutates it.
    /// Returns the successfully closed orders, silently omitting no-ops.
    pub async fn close_all(&mut self) -> Result<Vec<ExecutedOrder>> {
        let cids = self.book.executed_cids();
        let mut closed = Vec::with_capacity(cids.len());
        for cid in cids {
            if let Some(order) = self.close_order(cid).await? {
                closed.push(order);
            }
        }
        Ok(closed)
    }

    fn set_order_state(&mut self, cid: Uuid, state: OrderState) {
        if let Some(order) = self.book.get_executed_mut(cid) {
            order.state = state;
        }
    }
}
