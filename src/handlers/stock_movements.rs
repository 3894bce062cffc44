//! HTTP handlers for stock movement ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{require_admin, CurrentUser};
use crate::response::ApiResponse;
use crate::services::stock_movements::{
    BulkEntryError, CostAnalysis, CreateMovementInput, MovementFilter, MovementStats,
    StockMovementService, StockMovementWithProduct, UsageAnalytics,
};
use crate::AppState;

use super::inventory::Pagination;

/// Response for the filtered ledger listing
#[derive(Debug, Serialize)]
pub struct MovementListResponse {
    pub stock_movements: Vec<StockMovementWithProduct>,
    pub pagination: Pagination,
}

/// List ledger entries with filtering; the total count is independent of
/// pagination so clients can compute page numbers
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<MovementFilter>,
) -> AppResult<ApiResponse<MovementListResponse>> {
    let service = StockMovementService::new(state.db);
    let stock_movements = service.find_all(&filter).await?;
    let total = service.get_count(&filter).await?;

    let pagination = Pagination {
        limit: filter.limit.unwrap_or(50),
        offset: filter.offset.unwrap_or(0),
        total,
    };

    Ok(ApiResponse::ok(
        MovementListResponse {
            stock_movements,
            pagination,
        },
        "Stock movements retrieved successfully",
    ))
}

/// Get a single ledger entry
pub async fn get_movement(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<StockMovementWithProduct>> {
    let service = StockMovementService::new(state.db);
    let movement = service.find_by_id(id).await?;
    Ok(ApiResponse::ok(
        movement,
        "Stock movement retrieved successfully",
    ))
}

/// Query parameters carrying an optional limit
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// Response for the per-product ledger listing
#[derive(Debug, Serialize)]
pub struct ProductMovementsResponse {
    pub stock_movements: Vec<StockMovementWithProduct>,
    pub product_id: Uuid,
    pub count: usize,
}

/// Movements for a product, newest first
pub async fn get_movements_by_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> AppResult<ApiResponse<ProductMovementsResponse>> {
    let service = StockMovementService::new(state.db);
    let stock_movements = service
        .find_by_product(product_id, query.limit.unwrap_or(50))
        .await?;

    Ok(ApiResponse::ok(
        ProductMovementsResponse {
            count: stock_movements.len(),
            product_id,
            stock_movements,
        },
        "Product stock movements retrieved successfully",
    ))
}

/// Response for the recent-movements listing
#[derive(Debug, Serialize)]
pub struct RecentMovementsResponse {
    pub stock_movements: Vec<StockMovementWithProduct>,
    pub count: usize,
}

/// Most recent ledger entries across all products
pub async fn get_recent_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<LimitQuery>,
) -> AppResult<ApiResponse<RecentMovementsResponse>> {
    let service = StockMovementService::new(state.db);
    let stock_movements = service.get_recent(query.limit.unwrap_or(20)).await?;

    Ok(ApiResponse::ok(
        RecentMovementsResponse {
            count: stock_movements.len(),
            stock_movements,
        },
        "Recent stock movements retrieved successfully",
    ))
}

/// Query parameters for date-ranged analytics
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl DateRangeQuery {
    /// Both bounds are required for ranged analytics
    fn required(&self) -> AppResult<(NaiveDate, NaiveDate)> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(AppError::InvalidInput(
                "Date range (date_from and date_to) is required".to_string(),
            )),
        }
    }
}

/// Echo of the requested date range
#[derive(Debug, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Grand totals across all movement types
#[derive(Debug, Default, Serialize)]
pub struct StatsTotals {
    pub total_movements: i64,
    pub total_quantity: i64,
    pub total_value: Decimal,
}

/// Response for the movement statistics endpoint
#[derive(Debug, Serialize)]
pub struct MovementStatsResponse {
    pub date_range: DateRange,
    pub statistics: Vec<MovementStats>,
    pub totals: StatsTotals,
    pub formatted_total_value: String,
}

/// Per-type movement statistics for a required date range
pub async fn get_movement_stats(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<ApiResponse<MovementStatsResponse>> {
    let (date_from, date_to) = query.required()?;

    let service = StockMovementService::new(state.db);
    let statistics = service.get_movement_stats(date_from, date_to).await?;

    let totals = statistics
        .iter()
        .fold(StatsTotals::default(), |mut acc, stat| {
            acc.total_movements += stat.movement_count;
            acc.total_quantity += stat.total_quantity;
            acc.total_value += stat.total_value;
            acc
        });

    let formatted_total_value = format!("${}", totals.total_value.round_dp(2));

    Ok(ApiResponse::ok(
        MovementStatsResponse {
            date_range: DateRange {
                from: date_from,
                to: date_to,
            },
            statistics,
            totals,
            formatted_total_value,
        },
        "Movement statistics retrieved successfully",
    ))
}

/// Query parameters for usage analytics
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    pub days: Option<i64>,
}

/// Response for the usage analytics endpoint
#[derive(Debug, Serialize)]
pub struct UsageAnalyticsResponse {
    pub analytics: Vec<UsageAnalytics>,
    pub period_days: i64,
    pub total_products_used: usize,
    pub top_used_products: Vec<UsageAnalytics>,
}

/// Per-product OUT usage over a trailing window (default 30 days)
pub async fn get_usage_analytics(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<UsageQuery>,
) -> AppResult<ApiResponse<UsageAnalyticsResponse>> {
    let days = query.days.unwrap_or(30);
    if days <= 0 {
        return Err(AppError::InvalidInput(
            "days must be a positive number".to_string(),
        ));
    }

    let service = StockMovementService::new(state.db);
    let analytics = service.get_usage_analytics(days).await?;

    let top_used_products = analytics.iter().take(10).cloned().collect();

    Ok(ApiResponse::ok(
        UsageAnalyticsResponse {
            period_days: days,
            total_products_used: analytics.len(),
            top_used_products,
            analytics,
        },
        "Usage analytics retrieved successfully",
    ))
}

/// Grand totals across all categories
#[derive(Debug, Default, Serialize)]
pub struct CostTotals {
    pub total_purchases: Decimal,
    pub total_usage_cost: Decimal,
    pub total_purchase_transactions: i64,
    pub total_usage_transactions: i64,
}

/// Response for the cost analysis endpoint
#[derive(Debug, Serialize)]
pub struct CostAnalysisResponse {
    pub date_range: DateRange,
    pub analysis: Vec<CostAnalysis>,
    pub totals: CostTotals,
    pub formatted_purchases: String,
    pub formatted_usage_cost: String,
}

/// Per-category purchase/usage cost breakdown for a required date range
pub async fn get_cost_analysis(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<ApiResponse<CostAnalysisResponse>> {
    let (date_from, date_to) = query.required()?;

    let service = StockMovementService::new(state.db);
    let analysis = service.get_cost_analysis(date_from, date_to).await?;

    let totals = analysis
        .iter()
        .fold(CostTotals::default(), |mut acc, item| {
            acc.total_purchases += item.purchases;
            acc.total_usage_cost += item.usage_cost;
            acc.total_purchase_transactions += item.purchase_transactions;
            acc.total_usage_transactions += item.usage_transactions;
            acc
        });

    let formatted_purchases = format!("${}", totals.total_purchases.round_dp(2));
    let formatted_usage_cost = format!("${}", totals.total_usage_cost.round_dp(2));

    Ok(ApiResponse::ok(
        CostAnalysisResponse {
            date_range: DateRange {
                from: date_from,
                to: date_to,
            },
            analysis,
            totals,
            formatted_purchases,
            formatted_usage_cost,
        },
        "Cost analysis retrieved successfully",
    ))
}

/// Record a manual ledger entry (no aggregate side effect)
pub async fn create_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMovementInput>,
) -> AppResult<ApiResponse<StockMovementWithProduct>> {
    let service = StockMovementService::new(state.db);
    let movement = service
        .create(input, Some(current_user.0.user_id))
        .await?;
    Ok(ApiResponse::created(
        movement,
        "Stock movement recorded successfully",
    ))
}

/// Request body for the bulk insert
#[derive(Debug, Deserialize)]
pub struct BulkCreateInput {
    pub movements: Vec<CreateMovementInput>,
}

/// Response for the bulk insert, reporting per-entry outcomes
#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    pub created_movements: Vec<StockMovementWithProduct>,
    pub created_count: usize,
    pub errors: Vec<BulkEntryError>,
    pub error_count: usize,
}

/// Insert a batch of manual ledger entries (admin only); partial success
/// is reported per entry rather than failing the whole batch
pub async fn bulk_create_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkCreateInput>,
) -> AppResult<ApiResponse<BulkCreateResponse>> {
    require_admin(&current_user.0)?;

    if input.movements.is_empty() {
        return Err(AppError::InvalidInput(
            "Movements array is required".to_string(),
        ));
    }

    let service = StockMovementService::new(state.db);
    let result = service
        .bulk_create(input.movements, Some(current_user.0.user_id))
        .await?;

    Ok(ApiResponse::created(
        BulkCreateResponse {
            created_count: result.created_movements.len(),
            error_count: result.errors.len(),
            created_movements: result.created_movements,
            errors: result.errors,
        },
        "Bulk movement creation completed",
    ))
}

/// Remove a ledger row (admin only, no aggregate reconciliation)
pub async fn delete_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    require_admin(&current_user.0)?;

    let service = StockMovementService::new(state.db);
    service.delete(id).await?;
    Ok(ApiResponse::ok((), "Stock movement deleted successfully"))
}
