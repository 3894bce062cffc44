//! Stock movement ledger service
//!
//! The ledger is append-only: rows are created, queried and aggregated but
//! never updated. Deletion is an admin maintenance operation that does not
//! reconcile the inventory aggregate (see the resync path in `adjustment`).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::SortOrder;

/// Stock movement service for ledger writes, queries and analytics
#[derive(Clone)]
pub struct StockMovementService {
    db: PgPool,
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
        }
    }

    /// Signed effect of a movement of `quantity` on the stock level
    pub fn signed_delta(&self, quantity: i32) -> i32 {
        match self {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
        }
    }
}

/// Bare ledger row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub movement_type: MovementType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Ledger row joined with its product reference data
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovementWithProduct {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub movement_type: MovementType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub product_name: String,
    pub unit_cost: Decimal,
    pub category_name: Option<String>,
}

/// Input for recording a ledger entry
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMovementInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub movement_type: MovementType,
    pub notes: Option<String>,
}

/// Whitelisted sortable columns for movement listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementSortBy {
    CreatedAt,
    Quantity,
    MovementType,
    ProductName,
}

impl MovementSortBy {
    pub fn column(&self) -> &'static str {
        match self {
            MovementSortBy::CreatedAt => "sm.created_at",
            MovementSortBy::Quantity => "sm.quantity",
            MovementSortBy::MovementType => "sm.movement_type",
            MovementSortBy::ProductName => "p.name",
        }
    }
}

/// Filters for listing ledger entries
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub category_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort_by: Option<MovementSortBy>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Per-type movement statistics for a date range
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovementStats {
    pub movement_type: MovementType,
    pub movement_count: i64,
    pub total_quantity: i64,
    pub total_value: Decimal,
}

/// Per-product usage over a trailing window
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UsageAnalytics {
    pub product_id: Uuid,
    pub product_name: String,
    pub category_name: Option<String>,
    pub total_used: i64,
    pub usage_frequency: i64,
    pub usage_value: Decimal,
    pub avg_usage_per_transaction: Decimal,
}

/// Per-category purchase/usage cost breakdown for a date range
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CostAnalysis {
    pub category_name: String,
    pub purchases: Decimal,
    pub usage_cost: Decimal,
    pub purchase_transactions: i64,
    pub usage_transactions: i64,
}

/// Per-entry outcome of a bulk insert
#[derive(Debug, Serialize)]
pub struct BulkEntryError {
    pub index: usize,
    pub error: String,
}

/// Result of a bulk insert; partial success is the contract
#[derive(Debug, Serialize)]
pub struct BulkCreateResult {
    pub created_movements: Vec<StockMovementWithProduct>,
    pub errors: Vec<BulkEntryError>,
}

const SELECT_WITH_PRODUCT: &str = r#"
    SELECT sm.id, sm.product_id, sm.quantity, sm.movement_type, sm.notes,
           sm.created_at, sm.created_by,
           p.name AS product_name, p.unit_cost, c.name AS category_name
    FROM stock_movements sm
    JOIN products p ON sm.product_id = p.id
    LEFT JOIN categories c ON p.category_id = c.id
"#;

impl StockMovementService {
    /// Create a new StockMovementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a manual ledger entry
    ///
    /// This intentionally does not touch the inventory aggregate: manual
    /// entries document stock events already reflected elsewhere. Stock
    /// changes that must move the aggregate go through the adjustment
    /// orchestrator instead.
    pub async fn create(
        &self,
        input: CreateMovementInput,
        created_by: Option<Uuid>,
    ) -> AppResult<StockMovementWithProduct> {
        if input.quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
            });
        }

        let product_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(input.product_id)
                .fetch_one(&self.db)
                .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let mut conn = self.db.acquire().await?;
        let movement = append(
            &mut conn,
            input.product_id,
            input.quantity,
            input.movement_type,
            input.notes.as_deref(),
            created_by,
        )
        .await?;

        self.find_by_id(movement.id).await
    }

    /// Get a ledger entry by ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<StockMovementWithProduct> {
        let row = sqlx::query_as::<_, StockMovementWithProduct>(&format!(
            "{} WHERE sm.id = $1",
            SELECT_WITH_PRODUCT
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock movement".to_string()))?;

        Ok(row)
    }

    /// List ledger entries with filtering, sorting and pagination
    pub async fn find_all(
        &self,
        filter: &MovementFilter,
    ) -> AppResult<Vec<StockMovementWithProduct>> {
        let mut qb = self.filtered_query(SELECT_WITH_PRODUCT, filter);

        let sort_by = filter.sort_by.unwrap_or(MovementSortBy::CreatedAt);
        let sort_order = filter.sort_order.unwrap_or(SortOrder::Desc);
        qb.push(" ORDER BY ")
            .push(sort_by.column())
            .push(" ")
            .push(sort_order.as_sql());

        let limit = filter.limit.unwrap_or(50).max(1);
        let offset = filter.offset.unwrap_or(0).max(0);
        qb.push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb
            .build_query_as::<StockMovementWithProduct>()
            .fetch_all(&self.db)
            .await?;

        Ok(rows)
    }

    /// Total number of rows matching the filter, independent of pagination
    pub async fn get_count(&self, filter: &MovementFilter) -> AppResult<i64> {
        let mut qb = self.filtered_query(
            r#"
            SELECT COUNT(*)
            FROM stock_movements sm
            JOIN products p ON sm.product_id = p.id
            LEFT JOIN categories c ON p.category_id = c.id
            "#,
            filter,
        );

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    /// Movements for a product, newest first
    pub async fn find_by_product(
        &self,
        product_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<StockMovementWithProduct>> {
        let rows = sqlx::query_as::<_, StockMovementWithProduct>(&format!(
            "{} WHERE sm.product_id = $1 ORDER BY sm.created_at DESC LIMIT $2",
            SELECT_WITH_PRODUCT
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Most recent movements across all products
    pub async fn get_recent(&self, limit: i64) -> AppResult<Vec<StockMovementWithProduct>> {
        let rows = sqlx::query_as::<_, StockMovementWithProduct>(&format!(
            "{} ORDER BY sm.created_at DESC LIMIT $1",
            SELECT_WITH_PRODUCT
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Per-type movement statistics for an inclusive date range
    pub async fn get_movement_stats(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> AppResult<Vec<MovementStats>> {
        let rows = sqlx::query_as::<_, MovementStats>(
            r#"
            SELECT sm.movement_type,
                   COUNT(*) AS movement_count,
                   COALESCE(SUM(sm.quantity), 0)::BIGINT AS total_quantity,
                   COALESCE(SUM(sm.quantity * p.unit_cost), 0) AS total_value
            FROM stock_movements sm
            JOIN products p ON sm.product_id = p.id
            WHERE sm.created_at::date BETWEEN $1 AND $2
            GROUP BY sm.movement_type
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Per-product OUT usage over a trailing window of `days` ending now
    ///
    /// Products with no OUT movements in the window are excluded.
    pub async fn get_usage_analytics(&self, days: i64) -> AppResult<Vec<UsageAnalytics>> {
        let date_from = (Utc::now() - Duration::days(days)).date_naive();

        let rows = sqlx::query_as::<_, UsageAnalytics>(
            r#"
            SELECT p.id AS product_id,
                   p.name AS product_name,
                   c.name AS category_name,
                   COALESCE(SUM(CASE WHEN sm.movement_type = 'OUT' THEN sm.quantity ELSE 0 END), 0)::BIGINT AS total_used,
                   COUNT(CASE WHEN sm.movement_type = 'OUT' THEN 1 END) AS usage_frequency,
                   COALESCE(SUM(CASE WHEN sm.movement_type = 'OUT' THEN sm.quantity * p.unit_cost ELSE 0 END), 0) AS usage_value,
                   COALESCE(AVG(CASE WHEN sm.movement_type = 'OUT' THEN sm.quantity END), 0) AS avg_usage_per_transaction
            FROM products p
            LEFT JOIN stock_movements sm
                   ON sm.product_id = p.id AND sm.created_at::date >= $1
            LEFT JOIN categories c ON p.category_id = c.id
            GROUP BY p.id, p.name, c.name
            HAVING COALESCE(SUM(CASE WHEN sm.movement_type = 'OUT' THEN sm.quantity ELSE 0 END), 0) > 0
            ORDER BY total_used DESC
            "#,
        )
        .bind(date_from)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Per-category purchase and usage cost breakdown for a date range
    pub async fn get_cost_analysis(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> AppResult<Vec<CostAnalysis>> {
        let rows = sqlx::query_as::<_, CostAnalysis>(
            r#"
            SELECT c.name AS category_name,
                   COALESCE(SUM(CASE WHEN sm.movement_type = 'IN' THEN sm.quantity * p.unit_cost ELSE 0 END), 0) AS purchases,
                   COALESCE(SUM(CASE WHEN sm.movement_type = 'OUT' THEN sm.quantity * p.unit_cost ELSE 0 END), 0) AS usage_cost,
                   COUNT(CASE WHEN sm.movement_type = 'IN' THEN 1 END) AS purchase_transactions,
                   COUNT(CASE WHEN sm.movement_type = 'OUT' THEN 1 END) AS usage_transactions
            FROM stock_movements sm
            JOIN products p ON sm.product_id = p.id
            JOIN categories c ON p.category_id = c.id
            WHERE sm.created_at::date BETWEEN $1 AND $2
            GROUP BY c.id, c.name
            ORDER BY usage_cost DESC
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Insert a batch of manual ledger entries, collecting per-entry
    /// outcomes rather than failing the whole batch
    pub async fn bulk_create(
        &self,
        entries: Vec<CreateMovementInput>,
        created_by: Option<Uuid>,
    ) -> AppResult<BulkCreateResult> {
        let mut created_movements = Vec::new();
        let mut errors = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            match self.create(entry, created_by).await {
                Ok(movement) => created_movements.push(movement),
                Err(e) => errors.push(BulkEntryError {
                    index,
                    error: e.to_string(),
                }),
            }
        }

        Ok(BulkCreateResult {
            created_movements,
            errors,
        })
    }

    /// Remove a ledger row (admin maintenance)
    ///
    /// Does not reconcile the inventory aggregate; run the per-product
    /// resync afterwards if the deleted row had been applied to it.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM stock_movements WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Stock movement".to_string()));
        }

        Ok(())
    }

    /// Shared WHERE-clause construction for `find_all` / `get_count`
    fn filtered_query<'a>(
        &self,
        select: &str,
        filter: &'a MovementFilter,
    ) -> QueryBuilder<'a, Postgres> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(select);
        qb.push(" WHERE 1=1");

        if let Some(product_id) = filter.product_id {
            qb.push(" AND sm.product_id = ").push_bind(product_id);
        }

        if let Some(movement_type) = filter.movement_type {
            qb.push(" AND sm.movement_type = ").push_bind(movement_type);
        }

        if let Some(category_id) = filter.category_id {
            qb.push(" AND p.category_id = ").push_bind(category_id);
        }

        if let Some(date_from) = filter.date_from {
            qb.push(" AND sm.created_at::date >= ").push_bind(date_from);
        }

        if let Some(date_to) = filter.date_to {
            qb.push(" AND sm.created_at::date <= ").push_bind(date_to);
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR sm.notes ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb
    }
}

/// Append a ledger row inside the caller's transaction or connection
pub(crate) async fn append(
    conn: &mut PgConnection,
    product_id: Uuid,
    quantity: i32,
    movement_type: MovementType,
    notes: Option<&str>,
    created_by: Option<Uuid>,
) -> AppResult<StockMovement> {
    let row = sqlx::query_as::<_, StockMovement>(
        r#"
        INSERT INTO stock_movements (product_id, quantity, movement_type, notes, created_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, product_id, quantity, movement_type, notes, created_at, created_by
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(movement_type)
    .bind(notes)
    .bind(created_by)
    .fetch_one(conn)
    .await?;

    Ok(row)
}
