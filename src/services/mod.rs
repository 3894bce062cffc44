//! Business logic services for the Dentstock backend

pub mod adjustment;
pub mod inventory;
pub mod reporting;
pub mod stock_movements;

pub use adjustment::StockAdjustmentService;
pub use inventory::InventoryService;
pub use reporting::ReportingService;
pub use stock_movements::StockMovementService;

use serde::Deserialize;

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}
