use serde::{Deserialize, Serialize};
use std::fmt;

use super::item::SimpleItem;

/// What kind of work an order expects to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    #[default]
    Gather,
    Craft,
    Fight,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::Gather => f.write_str("gather"),
            OrderAction::Craft => f.write_str("craft"),
            OrderAction::Fight => f.write_str("fight"),
        }
    }
}

/// A demand for `item.quantity` units of `item.code` to be on hand
/// (inventory + bank). Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub item: SimpleItem,
    /// How many characters may work this order at once
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    #[serde(default)]
    pub action: OrderAction,
    /// Retryable failures so far
    #[serde(default)]
    pub attempts: u32,
    /// Code of the order this one supplies materials for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

fn default_concurrency() -> u32 {
    1
}

impl Order {
    pub fn new(code: impl Into<String>, quantity: u32) -> Self {
        Self {
            item: SimpleItem::new(code, quantity),
            concurrency: default_concurrency(),
            action: OrderAction::default(),
            attempts: 0,
            parent: None,
        }
    }

    pub fn with_action(mut self, action: OrderAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// A material requirement derived from this order, inheriting its concurrency hint
    pub fn sub_order(&self, code: impl Into<String>, quantity: u32) -> Order {
        Order {
            item: SimpleItem::new(code, quantity),
            concurrency: self.concurrency,
            action: OrderAction::Gather,
            attempts: 0,
            parent: Some(self.item.code.clone()),
        }
    }

    pub fn code(&self) -> &str {
        &self.item.code
    }

    pub fn quantity(&self) -> u32 {
        self.item.quantity
    }
}

impl From<SimpleItem> for Order {
    fn from(item: SimpleItem) -> Self {
        Order {
            item,
            concurrency: default_concurrency(),
            action: OrderAction::default(),
            attempts: 0,
            parent: None,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{} ({})", self.item.code, self.item.quantity, self.action)
    }
}
