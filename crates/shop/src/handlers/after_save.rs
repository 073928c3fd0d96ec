//! Handlers that run once the shop's changes are persisted.

use event_runner::{DomainEvent, EventHandler, HandlerError, UnitOfWork};

use crate::{LookupError, ShopDb, ShopEvent};

/// Ships the stock of a dispatched order and saves the new stock levels.
pub struct OrderDispatchedAfterHandler;

impl EventHandler<ShopEvent, ShopDb> for OrderDispatchedAfterHandler {
    fn handle(&self, event: &ShopEvent, db: &mut ShopDb) -> Result<(), HandlerError> {
        let ShopEvent::OrderDispatched { order_id, .. } = event else {
            return Err(LookupError::WrongEvent {
                handler: self.name(),
                event_type: event.event_type(),
            }
            .into());
        };

        let lines: Vec<_> = db
            .order(*order_id)
            .ok_or(LookupError::OrderNotFound(*order_id))?
            .line_items()
            .iter()
            .map(|line| (line.product_code.clone(), line.num_ordered))
            .collect();

        for (product_code, quantity) in lines {
            db.stock_mut(&product_code)
                .ok_or_else(|| LookupError::ProductNotFound(product_code.clone()))?
                .ship(quantity)?;
        }

        // The commit has already persisted; stock changes need their own save.
        db.persist()?;
        tracing::debug!(order_id = %order_id, "dispatched stock saved");
        Ok(())
    }
}
