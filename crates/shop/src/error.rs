//! Shop error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{OrderId, ProductCode};

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity for {product_code}: {quantity} (must be greater than 0)")]
    InvalidQuantity {
        product_code: ProductCode,
        quantity: u32,
    },

    /// Invalid price.
    #[error("Invalid price for {product_code}: {price} (must be greater than 0)")]
    InvalidPrice {
        product_code: ProductCode,
        price: i64,
    },

    /// Order was already dispatched.
    #[error("Order {0} has already been dispatched")]
    AlreadyDispatched(OrderId),
}

/// Errors raised by stock movements.
#[derive(Debug, Error)]
pub enum StockError {
    /// Not enough unallocated stock.
    #[error("Cannot allocate {requested} of {product_code}: only {available} available")]
    InsufficientStock {
        product_code: ProductCode,
        requested: u32,
        available: u32,
    },

    /// Shipping or releasing more than was allocated.
    #[error("Cannot take {requested} of {product_code}: only {allocated} allocated")]
    NotAllocated {
        product_code: ProductCode,
        requested: u32,
        allocated: u32,
    },
}

/// Errors raised when a handler cannot find what an event refers to.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No tracked order has this ID.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// No tracked stock record has this product code.
    #[error("No stock record for product {0}")]
    ProductNotFound(ProductCode),

    /// No tax rate applies on the date.
    #[error("No tax rate in effect on {0}")]
    NoTaxRate(DateTime<Utc>),

    /// The registry routed an event to the wrong handler.
    #[error("{handler} cannot handle the event {event_type}")]
    WrongEvent {
        handler: &'static str,
        event_type: &'static str,
    },
}

/// Errors returned by the in-memory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the write.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A row broke a table constraint.
    #[error("Constraint violation in {table}: {reason}")]
    ConstraintViolation { table: &'static str, reason: String },

    /// A row could not be serialized or read back.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
