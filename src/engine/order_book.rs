use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::{ExecutedOrder, OrderState, PendingOrder};

/// One open order tracked by the strategy instance
#[derive(Debug, Clone)]
pub enum BookOrder {
    /// Submitted, not yet acknowledged by the venue
    Pending(PendingOrder),
    /// Acknowledged, position open (or close in flight)
    Executed(ExecutedOrder),
}

impl BookOrder {
    pub fn cid(&self) -> Uuid {
        match self {
            BookOrder::Pending(order) => order.cid,
            BookOrder::Executed(order) => order.cid,
        }
    }
}

/// The set of currently open orders, unique by correlation id
///
/// Entries are added on open, removed on successful close. The engine owns
/// this exclusively; plugins only observe orders passed to hooks.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: Vec<BookOrder>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self { orders: Vec::new() }
    }

    pub fn push(&mut self, order: BookOrder) {
        self.orders.push(order);
    }

    /// Reinsert at the front; rollback path of a failed close
    pub fn insert_front(&mut self, order: BookOrder) {
        self.orders.insert(0, order);
    }

    /// Replace the pending entry matched by correlation id with its
    /// executed form
    pub fn replace(&mut self, cid: Uuid, executed: ExecutedOrder) -> Result<()> {
        match self.orders.iter_mut().find(|order| order.cid() == cid) {
            Some(entry) => {
                *entry = BookOrder::Executed(executed);
                Ok(())
            }
            None => Err(EngineError::Core(format!(
                "can't find order to replace, cid {cid}"
            ))),
        }
    }

    pub fn remove(&mut self, cid: Uuid) -> Option<BookOrder> {
        let index = self.orders.iter().position(|order| order.cid() == cid)?;
        Some(self.orders.remove(index))
    }

    pub fn get(&self, cid: Uuid) -> Option<&BookOrder> {
        self.orders.iter().find(|order| order.cid() == cid)
    }

    pub fn get_executed_mut(&mut self, cid: Uuid) -> Option<&mut ExecutedOrder> {
        self.orders.iter_mut().find_map(|order| match order {
            BookOrder::Executed(executed) if executed.cid == cid => Some(executed),
            _ => None,
        })
    }

    pub fn contains(&self, cid: Uuid) -> bool {
        self.orders.iter().any(|order| order.cid() == cid)
    }

    /// Correlation ids of acknowledged orders with no close in flight
    pub fn executed_cids(&self) -> Vec<Uuid> {
        self.orders
            .iter()
            .filter_map(|order| match order {
                BookOrder::Executed(executed) if executed.state == OrderState::Executed => {
                    Some(executed.cid)
                }
                _ => None,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookOrder> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
