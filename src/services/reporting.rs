//! Read-side reporting over the inventory aggregate and the ledger

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AppResult;
use crate::services::inventory::{InventoryService, LowStockSummary};
use crate::services::stock_movements::{StockMovementService, StockMovementWithProduct};

/// Number of ledger entries shown on the dashboard
const RECENT_ACTIVITY_LIMIT: i64 = 10;

/// Reporting service composing dashboard statistics
#[derive(Clone)]
pub struct ReportingService {
    inventory: InventoryService,
    movements: StockMovementService,
}

/// Dashboard statistics response
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_inventory_value: Decimal,
    pub formatted_total_value: String,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    pub categories_with_low_stock: usize,
    pub low_stock_by_category: Vec<LowStockSummary>,
    pub recent_activity: Vec<StockMovementWithProduct>,
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: sqlx::PgPool) -> Self {
        Self {
            inventory: InventoryService::new(db.clone()),
            movements: StockMovementService::new(db),
        }
    }

    /// Compose the inventory dashboard
    ///
    /// The four underlying queries are independent and run concurrently;
    /// the response is assembled once all have completed.
    pub async fn get_dashboard_stats(&self) -> AppResult<DashboardStats> {
        let (total_value, low_stock, summary, recent_activity) = tokio::try_join!(
            self.inventory.get_total_stock_value(),
            self.inventory.find_low_stock(),
            self.inventory.get_low_stock_summary(),
            self.movements.get_recent(RECENT_ACTIVITY_LIMIT),
        )?;

        let out_of_stock_count = low_stock
            .iter()
            .filter(|item| item.current_stock == 0)
            .count();

        Ok(DashboardStats {
            total_inventory_value: total_value,
            formatted_total_value: format!("${}", total_value.round_dp(2)),
            low_stock_count: low_stock.len(),
            out_of_stock_count,
            categories_with_low_stock: summary.len(),
            low_stock_by_category: summary,
            recent_activity,
        })
    }
}
