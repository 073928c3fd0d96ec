//! Shop domain events.

use chrono::{DateTime, Utc};
use event_runner::DomainEvent;
use serde::{Deserialize, Serialize};

use crate::{OrderId, ProductCode};

/// Routing names of the shop events.
pub mod event_types {
    pub const ORDER_CREATED: &str = "OrderCreated";
    pub const ALLOCATE_PRODUCT: &str = "AllocateProduct";
    pub const TAX_RATE_CHANGED: &str = "TaxRateChanged";
    pub const ORDER_DISPATCHED: &str = "OrderDispatched";
}

/// Events raised by shop entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShopEvent {
    /// A new order was placed.
    OrderCreated {
        order_id: OrderId,
        expected_dispatch_date: DateTime<Utc>,
    },

    /// Stock must be set aside for an order line.
    AllocateProduct {
        product_code: ProductCode,
        num_to_allocate: u32,
    },

    /// An order's tax rate changed and its grand total is stale.
    TaxRateChanged {
        order_id: OrderId,
        new_tax_rate_percent: u32,
    },

    /// An order left the warehouse.
    ///
    /// Raised for both phases: before save to re-apply tax, after save to
    /// ship the stock.
    OrderDispatched {
        order_id: OrderId,
        actual_dispatch_date: DateTime<Utc>,
    },
}

impl DomainEvent for ShopEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShopEvent::OrderCreated { .. } => event_types::ORDER_CREATED,
            ShopEvent::AllocateProduct { .. } => event_types::ALLOCATE_PRODUCT,
            ShopEvent::TaxRateChanged { .. } => event_types::TAX_RATE_CHANGED,
            ShopEvent::OrderDispatched { .. } => event_types::ORDER_DISPATCHED,
        }
    }
}
