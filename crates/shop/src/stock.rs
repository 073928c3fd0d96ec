//! Product stock entity.

use event_runner::{EventBuffer, EventRaiser};
use serde::{Deserialize, Serialize};

use crate::{ProductCode, ShopEvent, StockError};

/// Stock held for one product.
///
/// `num_allocated` counts units promised to orders that have not shipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductStock {
    product_code: ProductCode,
    num_in_stock: u32,
    num_allocated: u32,

    #[serde(skip)]
    events: EventBuffer<ShopEvent>,
}

impl ProductStock {
    /// Creates a stock record with nothing allocated.
    pub fn new(product_code: impl Into<ProductCode>, num_in_stock: u32) -> Self {
        Self {
            product_code: product_code.into(),
            num_in_stock,
            num_allocated: 0,
            events: EventBuffer::new(),
        }
    }

    pub fn product_code(&self) -> &ProductCode {
        &self.product_code
    }

    pub fn num_in_stock(&self) -> u32 {
        self.num_in_stock
    }

    pub fn num_allocated(&self) -> u32 {
        self.num_allocated
    }

    /// Units neither shipped nor allocated.
    pub fn available(&self) -> u32 {
        self.num_in_stock.saturating_sub(self.num_allocated)
    }

    /// Sets units aside for an order.
    pub fn allocate(&mut self, quantity: u32) -> Result<(), StockError> {
        if quantity > self.available() {
            return Err(StockError::InsufficientStock {
                product_code: self.product_code.clone(),
                requested: quantity,
                available: self.available(),
            });
        }
        self.num_allocated += quantity;
        Ok(())
    }

    /// Returns allocated units to the available pool.
    pub fn release(&mut self, quantity: u32) -> Result<(), StockError> {
        self.check_allocated(quantity)?;
        self.num_allocated -= quantity;
        Ok(())
    }

    /// Removes allocated units from stock once they have shipped.
    pub fn ship(&mut self, quantity: u32) -> Result<(), StockError> {
        self.check_allocated(quantity)?;
        self.num_allocated -= quantity;
        self.num_in_stock -= quantity;
        Ok(())
    }

    fn check_allocated(&self, quantity: u32) -> Result<(), StockError> {
        if quantity > self.num_allocated {
            return Err(StockError::NotAllocated {
                product_code: self.product_code.clone(),
                requested: quantity,
                allocated: self.num_allocated,
            });
        }
        Ok(())
    }
}

impl EventRaiser<ShopEvent> for ProductStock {
    fn event_buffer(&self) -> &EventBuffer<ShopEvent> {
        &self.events
    }

    fn event_buffer_mut(&mut self) -> &mut EventBuffer<ShopEvent> {
        &mut self.events
    }
}
