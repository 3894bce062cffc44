//! HTTP handlers for inventory aggregate endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::response::ApiResponse;
use crate::services::adjustment::{
    AdjustStockInput, CreateInventoryInput, StockAdjustmentService, UpdateStockInput,
};
use crate::services::inventory::{
    InventoryFilter, InventoryService, InventoryWithProduct, LowStockSummary, ReorderFrequency,
};
use crate::services::reporting::{DashboardStats, ReportingService};
use crate::AppState;

/// Pagination echo for list responses
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
}

/// Response for the filtered inventory listing
#[derive(Debug, Serialize)]
pub struct InventoryListResponse {
    pub inventory: Vec<InventoryWithProduct>,
    pub pagination: Pagination,
}

/// List inventory aggregates with filtering and pagination
pub async fn list_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<InventoryFilter>,
) -> AppResult<ApiResponse<InventoryListResponse>> {
    let service = InventoryService::new(state.db);
    let inventory = service.find_all(&filter).await?;

    let pagination = Pagination {
        limit: filter.limit.unwrap_or(50),
        offset: filter.offset.unwrap_or(0),
        total: inventory.len() as i64,
    };

    Ok(ApiResponse::ok(
        InventoryListResponse {
            inventory,
            pagination,
        },
        "Inventory retrieved successfully",
    ))
}

/// Get a single inventory aggregate
pub async fn get_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<InventoryWithProduct>> {
    let service = InventoryService::new(state.db);
    let inventory = service.find_by_id(id).await?;
    Ok(ApiResponse::ok(
        inventory,
        "Inventory item retrieved successfully",
    ))
}

/// Get the inventory aggregate for a product
pub async fn get_inventory_by_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<ApiResponse<InventoryWithProduct>> {
    let service = InventoryService::new(state.db);
    let inventory = service.find_by_product_id(product_id).await?;
    Ok(ApiResponse::ok(
        inventory,
        "Inventory item retrieved successfully",
    ))
}

/// Create an inventory aggregate (+ initial movement when stock is nonzero)
pub async fn create_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateInventoryInput>,
) -> AppResult<ApiResponse<InventoryWithProduct>> {
    let service = StockAdjustmentService::new(state.db);
    let inventory = service
        .create_inventory(input, current_user.0.user_id)
        .await?;
    Ok(ApiResponse::created(
        inventory,
        "Inventory created successfully",
    ))
}

/// Overwrite stock level fields
pub async fn update_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateStockInput>,
) -> AppResult<ApiResponse<InventoryWithProduct>> {
    let service = StockAdjustmentService::new(state.db);
    let inventory = service
        .update_stock(id, input, current_user.0.user_id)
        .await?;
    Ok(ApiResponse::ok(
        inventory,
        "Stock levels updated successfully",
    ))
}

/// Apply a typed IN/OUT adjustment to a product's stock
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<ApiResponse<InventoryWithProduct>> {
    let message = match input.movement_type {
        crate::services::stock_movements::MovementType::In => "Stock added successfully",
        crate::services::stock_movements::MovementType::Out => "Stock removed successfully",
    };

    let service = StockAdjustmentService::new(state.db);
    let inventory = service
        .adjust_stock(product_id, input, current_user.0.user_id)
        .await?;
    Ok(ApiResponse::ok(inventory, message))
}

/// Recompute the aggregate from the ledger (admin maintenance)
pub async fn resync_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<ApiResponse<InventoryWithProduct>> {
    require_admin(&current_user.0)?;

    let service = StockAdjustmentService::new(state.db);
    let inventory = service.resync(product_id).await?;
    Ok(ApiResponse::ok(
        inventory,
        "Inventory resynced from ledger successfully",
    ))
}

/// Delete an inventory aggregate (only when stock is zero)
pub async fn delete_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    let service = InventoryService::new(state.db);
    service.delete(id).await?;
    Ok(ApiResponse::ok((), "Inventory deleted successfully"))
}

/// Response for the low-stock listing
#[derive(Debug, Serialize)]
pub struct LowStockResponse {
    pub inventory: Vec<InventoryWithProduct>,
    pub count: usize,
    pub critical_count: usize,
}

/// List low-stock aggregates, most critical first
pub async fn get_low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<ApiResponse<LowStockResponse>> {
    let service = InventoryService::new(state.db);
    let inventory = service.find_low_stock().await?;

    let critical_count = inventory
        .iter()
        .filter(|item| item.current_stock == 0)
        .count();

    Ok(ApiResponse::ok(
        LowStockResponse {
            count: inventory.len(),
            critical_count,
            inventory,
        },
        "Low stock items retrieved successfully",
    ))
}

/// Response for the per-category low-stock summary
#[derive(Debug, Serialize)]
pub struct LowStockSummaryResponse {
    pub summary: Vec<LowStockSummary>,
    pub total_categories_affected: usize,
    pub total_low_stock_items: i64,
}

/// Per-category low-stock rollup
pub async fn get_low_stock_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<ApiResponse<LowStockSummaryResponse>> {
    let service = InventoryService::new(state.db);
    let summary = service.get_low_stock_summary().await?;

    let total_low_stock_items = summary.iter().map(|cat| cat.low_stock_count).sum();

    Ok(ApiResponse::ok(
        LowStockSummaryResponse {
            total_categories_affected: summary.len(),
            total_low_stock_items,
            summary,
        },
        "Low stock summary retrieved successfully",
    ))
}

/// Response for the total stock value
#[derive(Debug, Serialize)]
pub struct InventoryValueResponse {
    pub total_inventory_value: Decimal,
    pub formatted_value: String,
}

/// Total value of stock on hand
pub async fn get_inventory_value(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<ApiResponse<InventoryValueResponse>> {
    let service = InventoryService::new(state.db);
    let total_value = service.get_total_stock_value().await?;

    Ok(ApiResponse::ok(
        InventoryValueResponse {
            total_inventory_value: total_value,
            formatted_value: format!("${}", total_value.round_dp(2)),
        },
        "Total inventory value calculated successfully",
    ))
}

/// Dashboard statistics
pub async fn get_dashboard_stats(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    let service = ReportingService::new(state.db);
    let stats = service.get_dashboard_stats().await?;
    Ok(ApiResponse::ok(
        stats,
        "Dashboard stats retrieved successfully",
    ))
}

/// Response for the reorder-frequency listing
#[derive(Debug, Serialize)]
pub struct FrequencyResponse {
    pub inventory: Vec<InventoryWithProduct>,
    pub frequency: ReorderFrequency,
    pub count: usize,
}

/// List aggregates for products with the given reorder frequency
pub async fn get_inventory_by_frequency(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(frequency): Path<ReorderFrequency>,
) -> AppResult<ApiResponse<FrequencyResponse>> {
    let service = InventoryService::new(state.db);
    let inventory = service.find_by_frequency(frequency).await?;

    Ok(ApiResponse::ok(
        FrequencyResponse {
            count: inventory.len(),
            frequency,
            inventory,
        },
        format!(
            "Inventory items with {} reorder frequency retrieved successfully",
            frequency.as_str()
        ),
    ))
}
