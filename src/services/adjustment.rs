//! Stock adjustment orchestrator
//!
//! The only write path that changes `current_stock`. Each operation locks
//! the aggregate row, computes the new stock level, writes it and appends
//! the matching ledger entry inside one transaction, so the aggregate and
//! the ledger commit or roll back together and concurrent adjustments on
//! the same product serialize.

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::inventory::{self, InventoryService, InventoryWithProduct};
use crate::services::stock_movements::{self, MovementType};

/// Orchestrates aggregate updates paired with ledger appends
#[derive(Clone)]
pub struct StockAdjustmentService {
    db: sqlx::PgPool,
    inventory: InventoryService,
}

/// Input for creating an inventory aggregate
#[derive(Debug, Deserialize)]
pub struct CreateInventoryInput {
    pub product_id: Uuid,
    pub current_stock: i32,
    pub min_stock: i32,
    pub max_stock: i32,
}

/// Input for overwriting stock level fields
#[derive(Debug, Deserialize)]
pub struct UpdateStockInput {
    pub current_stock: Option<i32>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
}

/// Input for a typed IN/OUT adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub quantity: i32,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub notes: Option<String>,
}

impl StockAdjustmentService {
    /// Create a new StockAdjustmentService instance
    pub fn new(db: sqlx::PgPool) -> Self {
        let inventory = InventoryService::new(db.clone());
        Self { db, inventory }
    }

    /// Create the aggregate for a product, synthesizing an initial IN
    /// movement when the starting stock is nonzero
    pub async fn create_inventory(
        &self,
        input: CreateInventoryInput,
        created_by: Uuid,
    ) -> AppResult<InventoryWithProduct> {
        if input.current_stock < 0 {
            return Err(AppError::Validation {
                field: "current_stock".to_string(),
                message: "Stock cannot be negative".to_string(),
            });
        }
        if input.min_stock < 0 {
            return Err(AppError::Validation {
                field: "min_stock".to_string(),
                message: "Minimum stock cannot be negative".to_string(),
            });
        }
        if input.max_stock < input.min_stock {
            return Err(AppError::Validation {
                field: "max_stock".to_string(),
                message: "Maximum stock cannot be below minimum stock".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let product_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(input.product_id)
                .fetch_one(&mut *tx)
                .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let already_tracked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory WHERE product_id = $1)",
        )
        .bind(input.product_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_tracked {
            return Err(AppError::Conflict(
                "Inventory already exists for this product".to_string(),
            ));
        }

        let created = inventory::insert(
            &mut *tx,
            input.product_id,
            input.current_stock,
            input.min_stock,
            input.max_stock,
        )
        .await?;

        if input.current_stock > 0 {
            stock_movements::append(
                &mut *tx,
                input.product_id,
                input.current_stock,
                MovementType::In,
                Some("Initial inventory setup"),
                Some(created_by),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            inventory_id = %created.id,
            product_id = %input.product_id,
            initial_stock = input.current_stock,
            "inventory created"
        );

        self.inventory.find_by_id(created.id).await
    }

    /// Overwrite the supplied stock fields; a changed `current_stock`
    /// appends a derived movement for the delta, a zero delta appends
    /// nothing
    pub async fn update_stock(
        &self,
        id: Uuid,
        input: UpdateStockInput,
        updated_by: Uuid,
    ) -> AppResult<InventoryWithProduct> {
        if input.current_stock.is_none() && input.min_stock.is_none() && input.max_stock.is_none() {
            return Err(AppError::InvalidInput(
                "No valid fields to update".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let existing = inventory::lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        let current_stock = input.current_stock.unwrap_or(existing.current_stock);
        let min_stock = input.min_stock.unwrap_or(existing.min_stock);
        let max_stock = input.max_stock.unwrap_or(existing.max_stock);

        if current_stock < 0 {
            return Err(AppError::Validation {
                field: "current_stock".to_string(),
                message: "Stock cannot be negative".to_string(),
            });
        }
        if min_stock < 0 {
            return Err(AppError::Validation {
                field: "min_stock".to_string(),
                message: "Minimum stock cannot be negative".to_string(),
            });
        }
        if max_stock < min_stock {
            return Err(AppError::Validation {
                field: "max_stock".to_string(),
                message: "Maximum stock cannot be below minimum stock".to_string(),
            });
        }

        inventory::update_levels(&mut *tx, id, current_stock, min_stock, max_stock).await?;

        let delta = current_stock - existing.current_stock;
        if delta != 0 {
            let movement_type = if delta > 0 {
                MovementType::In
            } else {
                MovementType::Out
            };
            stock_movements::append(
                &mut *tx,
                existing.product_id,
                delta.abs(),
                movement_type,
                Some("Stock level updated via API"),
                Some(updated_by),
            )
            .await?;
        }

        tx.commit().await?;

        self.inventory.find_by_id(id).await
    }

    /// Apply a typed IN/OUT adjustment to a product's stock
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        input: AdjustStockInput,
        adjusted_by: Uuid,
    ) -> AppResult<InventoryWithProduct> {
        if input.quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let existing = inventory::lock_by_product(&mut *tx, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item for this product".to_string()))?;

        let new_stock = existing.current_stock + input.movement_type.signed_delta(input.quantity);
        if new_stock < 0 {
            return Err(AppError::InsufficientStock(format!(
                "Cannot remove {} units; only {} in stock",
                input.quantity, existing.current_stock
            )));
        }

        inventory::set_current_stock(&mut *tx, existing.id, new_stock).await?;

        let default_notes = match input.movement_type {
            MovementType::In => "Stock added via API",
            MovementType::Out => "Stock removed via API",
        };
        stock_movements::append(
            &mut *tx,
            product_id,
            input.quantity,
            input.movement_type,
            Some(input.notes.as_deref().unwrap_or(default_notes)),
            Some(adjusted_by),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            movement_type = input.movement_type.as_str(),
            quantity = input.quantity,
            new_stock,
            "stock adjusted"
        );

        self.inventory.find_by_product_id(product_id).await
    }

    /// Recompute `current_stock` from the ledger fold (admin maintenance)
    ///
    /// Recovery path after admin ledger edits (manual entries applied
    /// retroactively, deleted rows). Fails if the ledger sums to a
    /// negative stock level, which indicates the ledger itself needs
    /// repair first.
    pub async fn resync(&self, product_id: Uuid) -> AppResult<InventoryWithProduct> {
        let mut tx = self.db.begin().await?;

        let existing = inventory::lock_by_product(&mut *tx, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item for this product".to_string()))?;

        let ledger_sum = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN movement_type = 'IN' THEN quantity
                                     ELSE -quantity END), 0)::BIGINT
            FROM stock_movements
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        if ledger_sum < 0 {
            return Err(AppError::Conflict(format!(
                "Ledger sums to {} for this product; repair the ledger before resyncing",
                ledger_sum
            )));
        }

        let recomputed = i32::try_from(ledger_sum)
            .map_err(|_| AppError::Internal("Ledger sum exceeds stock range".to_string()))?;

        if recomputed != existing.current_stock {
            inventory::set_current_stock(&mut *tx, existing.id, recomputed).await?;
            tracing::warn!(
                product_id = %product_id,
                previous = existing.current_stock,
                recomputed,
                "aggregate drifted from ledger; resynced"
            );
        }

        tx.commit().await?;

        self.inventory.find_by_product_id(product_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The transactional paths are covered by the integration suites in
    // tests/; these exercise the pure stock arithmetic.

    #[test]
    fn prospective_stock_applies_signed_delta() {
        assert_eq!(10 + MovementType::In.signed_delta(4), 14);
        assert_eq!(10 + MovementType::Out.signed_delta(6), 4);
    }

    #[test]
    fn overwrite_delta_direction() {
        let existing = 10;
        let updated = 4;
        let delta: i32 = updated - existing;
        assert!(delta < 0);
        assert_eq!(delta.abs(), 6);
    }
}
