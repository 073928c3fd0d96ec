//! Order entity.

use chrono::{DateTime, Utc};
use event_runner::{EventBuffer, EventRaiser, Phase};
use serde::{Deserialize, Serialize};

use crate::{BasketItem, Money, OrderError, OrderId, ProductCode, ShopEvent};

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Position in the order, starting at 1.
    pub line_num: usize,

    /// The product ordered.
    pub product_code: ProductCode,

    /// Quantity ordered.
    pub num_ordered: u32,

    /// Price per unit when the order was placed.
    pub product_price: Money,
}

impl LineItem {
    /// Returns the price of the line (quantity * unit price).
    pub fn line_total(&self) -> Money {
        self.product_price.multiply(self.num_ordered)
    }
}

/// A customer order.
///
/// Creating an order and dispatching it raise the events that allocate
/// stock, apply tax, and ship the goods when the changes are saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_name: String,
    date_created: DateTime<Utc>,
    expected_dispatch_date: DateTime<Utc>,
    actual_dispatch_date: Option<DateTime<Utc>>,
    line_items: Vec<LineItem>,
    total_price_no_tax: Money,
    tax_rate_percent: u32,
    grand_total_price: Money,

    #[serde(skip)]
    events: EventBuffer<ShopEvent>,
}

impl Order {
    /// Creates an order from basket items.
    ///
    /// Raises `OrderCreated`, then one `AllocateProduct` per line.
    pub fn new(
        customer_name: impl Into<String>,
        expected_dispatch_date: DateTime<Utc>,
        items: Vec<BasketItem>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let mut line_items = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if item.num_ordered == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_code: item.product_code,
                    quantity: item.num_ordered,
                });
            }
            if !item.product_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    product_code: item.product_code,
                    price: item.product_price.cents(),
                });
            }
            line_items.push(LineItem {
                line_num: index + 1,
                product_code: item.product_code,
                num_ordered: item.num_ordered,
                product_price: item.product_price,
            });
        }

        let total_price_no_tax: Money = line_items.iter().map(LineItem::line_total).sum();
        let mut order = Self {
            id: OrderId::new(),
            customer_name: customer_name.into(),
            date_created: Utc::now(),
            expected_dispatch_date,
            actual_dispatch_date: None,
            line_items,
            total_price_no_tax,
            tax_rate_percent: 0,
            grand_total_price: total_price_no_tax,
            events: EventBuffer::new(),
        };

        order.raise_event(
            ShopEvent::OrderCreated {
                order_id: order.id,
                expected_dispatch_date,
            },
            Phase::Before,
        );
        let allocations: Vec<ShopEvent> = order
            .line_items
            .iter()
            .map(|line| ShopEvent::AllocateProduct {
                product_code: line.product_code.clone(),
                num_to_allocate: line.num_ordered,
            })
            .collect();
        for event in allocations {
            order.raise_event(event, Phase::Before);
        }

        Ok(order)
    }

    /// Records that the order left the warehouse.
    ///
    /// Raises `OrderDispatched` for both phases.
    pub fn order_has_been_dispatched(
        &mut self,
        actual_dispatch_date: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.actual_dispatch_date.is_some() {
            return Err(OrderError::AlreadyDispatched(self.id));
        }

        self.actual_dispatch_date = Some(actual_dispatch_date);
        let event = ShopEvent::OrderDispatched {
            order_id: self.id,
            actual_dispatch_date,
        };
        self.raise_event(event.clone(), Phase::Before);
        self.raise_event(event, Phase::After);
        Ok(())
    }

    /// Sets the tax rate, raising `TaxRateChanged` if it differs.
    pub fn set_tax_rate_percent(&mut self, new_tax_rate_percent: u32) {
        if new_tax_rate_percent == self.tax_rate_percent {
            return;
        }
        self.tax_rate_percent = new_tax_rate_percent;
        self.raise_event(
            ShopEvent::TaxRateChanged {
                order_id: self.id,
                new_tax_rate_percent,
            },
            Phase::Before,
        );
    }

    /// Recomputes the grand total from the current tax rate.
    pub fn refresh_grand_total(&mut self) {
        self.grand_total_price = self.total_price_no_tax.with_tax_percent(self.tax_rate_percent);
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    pub fn expected_dispatch_date(&self) -> DateTime<Utc> {
        self.expected_dispatch_date
    }

    pub fn actual_dispatch_date(&self) -> Option<DateTime<Utc>> {
        self.actual_dispatch_date
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total_price_no_tax(&self) -> Money {
        self.total_price_no_tax
    }

    pub fn tax_rate_percent(&self) -> u32 {
        self.tax_rate_percent
    }

    pub fn grand_total_price(&self) -> Money {
        self.grand_total_price
    }

    /// Returns true once the order has been marked dispatched.
    pub fn is_dispatched(&self) -> bool {
        self.actual_dispatch_date.is_some()
    }
}

impl EventRaiser<ShopEvent> for Order {
    fn event_buffer(&self) -> &EventBuffer<ShopEvent> {
        &self.events
    }

    fn event_buffer_mut(&mut self) -> &mut EventBuffer<ShopEvent> {
        &mut self.events
    }
}
