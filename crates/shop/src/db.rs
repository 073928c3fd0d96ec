//! In-memory shop database acting as the unit of work.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use event_runner::{EntityTracker, EventRaiser, UnitOfWork};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::tax::rate_in_effect;
use crate::{LookupError, Order, OrderId, ProductCode, ProductStock, ShopEvent, StoreError, TaxRate};

const ORDERS: &str = "orders";
const STOCKS: &str = "product_stocks";
const TAX_RATES: &str = "tax_rates";

type Table = BTreeMap<String, serde_json::Value>;

/// Tracks orders, stock and tax rates, and persists them as JSON rows.
///
/// Tracked entities are the working copy; [`UnitOfWork::persist`] replaces
/// the saved rows with a snapshot of them, or leaves the rows untouched if
/// any check fails.
#[derive(Debug, Default)]
pub struct ShopDb {
    orders: Vec<Order>,
    stocks: Vec<ProductStock>,
    tax_rates: Vec<TaxRate>,
    saved: BTreeMap<&'static str, Table>,
    persist_count: usize,
    fail_next_persist: Option<String>,
}

impl ShopDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a database with the standard stock and tax rates, already
    /// persisted.
    ///
    /// Stock: Product1 = 5, Product2 = 10, Product3 = 20. Tax: 4% from the
    /// start of time, 9% from five days after `now`.
    pub fn seeded(now: DateTime<Utc>) -> Result<Self, StoreError> {
        let mut db = Self::new();
        db.add_stock(ProductStock::new("Product1", 5));
        db.add_stock(ProductStock::new("Product2", 10));
        db.add_stock(ProductStock::new("Product3", 20));
        db.add_tax_rate(TaxRate::new(DateTime::<Utc>::MIN_UTC, 4));
        db.add_tax_rate(TaxRate::new(now + Duration::days(5), 9));
        db.persist()?;
        Ok(db)
    }

    /// Starts tracking an order.
    pub fn add_order(&mut self, order: Order) -> OrderId {
        let id = order.id();
        self.orders.push(order);
        id
    }

    /// Starts tracking a stock record.
    pub fn add_stock(&mut self, stock: ProductStock) {
        self.stocks.push(stock);
    }

    pub fn add_tax_rate(&mut self, rate: TaxRate) {
        self.tax_rates.push(rate);
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id() == id)
    }

    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id() == id)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn stock(&self, product_code: &ProductCode) -> Option<&ProductStock> {
        self.stocks.iter().find(|s| s.product_code() == product_code)
    }

    pub fn stock_mut(&mut self, product_code: &ProductCode) -> Option<&mut ProductStock> {
        self.stocks
            .iter_mut()
            .find(|s| s.product_code() == product_code)
    }

    pub fn stocks(&self) -> &[ProductStock] {
        &self.stocks
    }

    /// Returns the tax rate in effect on `date`.
    pub fn tax_rate_in_effect(&self, date: DateTime<Utc>) -> Result<u32, LookupError> {
        rate_in_effect(&self.tax_rates, date).ok_or(LookupError::NoTaxRate(date))
    }

    /// Makes the next persist fail with [`StoreError::Unavailable`].
    pub fn fail_next_persist(&mut self, reason: impl Into<String>) {
        self.fail_next_persist = Some(reason.into());
    }

    /// Returns how many times changes were persisted.
    pub fn persist_count(&self) -> usize {
        self.persist_count
    }

    /// Returns the number of saved rows in a table.
    pub fn saved_row_count(&self, table: &str) -> usize {
        self.saved.get(table).map_or(0, BTreeMap::len)
    }

    /// Reads an order back from the saved rows.
    pub fn load_saved_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.load_saved(ORDERS, &id.to_string())
    }

    /// Reads a stock record back from the saved rows.
    pub fn load_saved_stock(
        &self,
        product_code: &ProductCode,
    ) -> Result<Option<ProductStock>, StoreError> {
        self.load_saved(STOCKS, product_code.as_str())
    }

    fn load_saved<T: DeserializeOwned>(
        &self,
        table: &'static str,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        self.saved
            .get(table)
            .and_then(|rows| rows.get(key))
            .map(|row| serde_json::from_value(row.clone()))
            .transpose()
            .map_err(StoreError::from)
    }

    fn check_constraints(&self) -> Result<(), StoreError> {
        for stock in &self.stocks {
            if stock.num_allocated() > stock.num_in_stock() {
                return Err(StoreError::ConstraintViolation {
                    table: STOCKS,
                    reason: format!(
                        "{} has {} allocated but only {} in stock",
                        stock.product_code(),
                        stock.num_allocated(),
                        stock.num_in_stock()
                    ),
                });
            }
        }
        Ok(())
    }
}

fn snapshot<T, K>(rows: &[T], key: K) -> Result<Table, StoreError>
where
    T: Serialize,
    K: Fn(usize, &T) -> String,
{
    rows.iter()
        .enumerate()
        .map(|(index, row)| -> Result<_, StoreError> {
            Ok((key(index, row), serde_json::to_value(row)?))
        })
        .collect()
}

impl EntityTracker<ShopEvent> for ShopDb {
    fn visit_tracked(&mut self, visit: &mut dyn FnMut(&mut dyn EventRaiser<ShopEvent>)) {
        for order in &mut self.orders {
            visit(order);
        }
        for stock in &mut self.stocks {
            visit(stock);
        }
    }
}

impl UnitOfWork<ShopEvent> for ShopDb {
    type Error = StoreError;

    fn persist(&mut self) -> Result<(), StoreError> {
        if let Some(reason) = self.fail_next_persist.take() {
            return Err(StoreError::Unavailable(reason));
        }
        self.check_constraints()?;

        let mut saved = BTreeMap::new();
        saved.insert(ORDERS, snapshot(&self.orders, |_, o| o.id().to_string())?);
        saved.insert(
            STOCKS,
            snapshot(&self.stocks, |_, s| s.product_code().to_string())?,
        );
        saved.insert(
            TAX_RATES,
            // Rates may share a start time, so rows are keyed by position.
            snapshot(&self.tax_rates, |index, _| format!("{index:06}"))?,
        );
        self.saved = saved;
        self.persist_count += 1;

        tracing::debug!(
            orders = self.orders.len(),
            stocks = self.stocks.len(),
            persist_count = self.persist_count,
            "shop changes persisted"
        );
        Ok(())
    }
}
