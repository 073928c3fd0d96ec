//! A small order-and-stock domain committed through the event runner.
//!
//! Creating an order allocates stock and applies tax before it is saved.
//! Dispatching it re-applies tax for the dispatch date before saving and
//! ships the stock after saving.

pub mod context;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod order;
pub mod stock;
pub mod tax;
pub mod value_objects;

pub use context::{ContextError, ShopContext, create_seeded_context};
pub use db::ShopDb;
pub use error::{LookupError, OrderError, StockError, StoreError};
pub use events::ShopEvent;
pub use handlers::{ShopRunner, handler_registry, shop_runner};
pub use order::{LineItem, Order};
pub use stock::ProductStock;
pub use tax::TaxRate;
pub use value_objects::{BasketItem, Money, OrderId, ProductCode};
