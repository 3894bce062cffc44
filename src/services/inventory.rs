//! Inventory aggregate service
//!
//! Owns the derived `current_stock` row per product. Reads return fixed
//! joined projections; row writes are exposed only to the stock adjustment
//! orchestrator so every stock change stays paired with its ledger entry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::SortOrder;

/// Inventory service for aggregate reads and lifecycle
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Bare inventory aggregate row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Inventory {
    pub id: Uuid,
    pub product_id: Uuid,
    pub current_stock: i32,
    pub min_stock: i32,
    pub max_stock: i32,
    pub last_updated: DateTime<Utc>,
}

/// Inventory aggregate joined with its product reference data
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryWithProduct {
    pub id: Uuid,
    pub product_id: Uuid,
    pub current_stock: i32,
    pub min_stock: i32,
    pub max_stock: i32,
    pub last_updated: DateTime<Utc>,
    pub product_name: String,
    pub unit_cost: Decimal,
    pub reorder_frequency: String,
    pub category_name: Option<String>,
    pub supplier_name: Option<String>,
}

/// Product reorder cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReorderFrequency {
    Weekly,
    Monthly,
    Quarterly,
    #[serde(rename = "One-Time")]
    OneTime,
}

impl ReorderFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReorderFrequency::Weekly => "Weekly",
            ReorderFrequency::Monthly => "Monthly",
            ReorderFrequency::Quarterly => "Quarterly",
            ReorderFrequency::OneTime => "One-Time",
        }
    }
}

/// Whitelisted sortable columns for inventory listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventorySortBy {
    ProductName,
    CategoryName,
    SupplierName,
    CurrentStock,
    MinStock,
    MaxStock,
    LastUpdated,
}

impl InventorySortBy {
    /// Column expression the variant maps to; client input never reaches
    /// the query text directly.
    pub fn column(&self) -> &'static str {
        match self {
            InventorySortBy::ProductName => "p.name",
            InventorySortBy::CategoryName => "c.name",
            InventorySortBy::SupplierName => "s.name",
            InventorySortBy::CurrentStock => "i.current_stock",
            InventorySortBy::MinStock => "i.min_stock",
            InventorySortBy::MaxStock => "i.max_stock",
            InventorySortBy::LastUpdated => "i.last_updated",
        }
    }
}

/// Filters for listing inventory aggregates
#[derive(Debug, Default, Deserialize)]
pub struct InventoryFilter {
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub low_stock: Option<bool>,
    pub out_of_stock: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<InventorySortBy>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Per-category rollup of low-stock items
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockSummary {
    pub category_name: String,
    pub low_stock_count: i64,
    pub total_value: Decimal,
}

const SELECT_WITH_PRODUCT: &str = r#"
    SELECT i.id, i.product_id, i.current_stock, i.min_stock, i.max_stock, i.last_updated,
           p.name AS product_name, p.unit_cost, p.reorder_frequency,
           c.name AS category_name, s.name AS supplier_name
    FROM inventory i
    JOIN products p ON i.product_id = p.id
    LEFT JOIN categories c ON p.category_id = c.id
    LEFT JOIN suppliers s ON p.supplier_id = s.id
"#;

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get an inventory aggregate by its ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<InventoryWithProduct> {
        let row = sqlx::query_as::<_, InventoryWithProduct>(&format!(
            "{} WHERE i.id = $1",
            SELECT_WITH_PRODUCT
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        Ok(row)
    }

    /// Get the inventory aggregate for a product
    pub async fn find_by_product_id(&self, product_id: Uuid) -> AppResult<InventoryWithProduct> {
        let row = sqlx::query_as::<_, InventoryWithProduct>(&format!(
            "{} WHERE i.product_id = $1",
            SELECT_WITH_PRODUCT
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item for this product".to_string()))?;

        Ok(row)
    }

    /// List inventory aggregates with filtering, sorting and pagination
    pub async fn find_all(&self, filter: &InventoryFilter) -> AppResult<Vec<InventoryWithProduct>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_WITH_PRODUCT);
        qb.push(" WHERE 1=1");

        if let Some(category_id) = filter.category_id {
            qb.push(" AND p.category_id = ").push_bind(category_id);
        }

        if let Some(supplier_id) = filter.supplier_id {
            qb.push(" AND p.supplier_id = ").push_bind(supplier_id);
        }

        if filter.low_stock.unwrap_or(false) {
            qb.push(" AND i.current_stock <= i.min_stock");
        }

        if filter.out_of_stock.unwrap_or(false) {
            qb.push(" AND i.current_stock = 0");
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        let sort_by = filter.sort_by.unwrap_or(InventorySortBy::ProductName);
        let sort_order = filter.sort_order.unwrap_or(SortOrder::Asc);
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
            .build_query_as::<InventoryWithProduct>()
            .fetch_all(&self.db)
            .await?;

        Ok(rows)
    }

    /// Get all low-stock aggregates, most critical first
    ///
    /// A `min_stock` of zero ranks as maximally critical instead of
    /// dividing by zero.
    pub async fn find_low_stock(&self) -> AppResult<Vec<InventoryWithProduct>> {
        let rows = sqlx::query_as::<_, InventoryWithProduct>(&format!(
            r#"{}
            WHERE i.current_stock <= i.min_stock
            ORDER BY CASE WHEN i.min_stock = 0 THEN 0
                          ELSE i.current_stock::numeric / i.min_stock
                     END ASC
            "#,
            SELECT_WITH_PRODUCT
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Get aggregates for products with the given reorder frequency
    pub async fn find_by_frequency(
        &self,
        frequency: ReorderFrequency,
    ) -> AppResult<Vec<InventoryWithProduct>> {
        let rows = sqlx::query_as::<_, InventoryWithProduct>(&format!(
            "{} WHERE p.reorder_frequency = $1 ORDER BY p.name",
            SELECT_WITH_PRODUCT
        ))
        .bind(frequency.as_str())
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Per-category count and value of low-stock items, highest count first
    pub async fn get_low_stock_summary(&self) -> AppResult<Vec<LowStockSummary>> {
        let rows = sqlx::query_as::<_, LowStockSummary>(
            r#"
            SELECT c.name AS category_name, COUNT(*) AS low_stock_count,
                   COALESCE(SUM(i.current_stock * p.unit_cost), 0) AS total_value
            FROM inventory i
            JOIN products p ON i.product_id = p.id
            JOIN categories c ON p.category_id = c.id
            WHERE i.current_stock <= i.min_stock
            GROUP BY c.id, c.name
            ORDER BY low_stock_count DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Total value of stock on hand; zero when inventory is empty
    pub async fn get_total_stock_value(&self) -> AppResult<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(i.current_stock * p.unit_cost), 0)
            FROM inventory i
            JOIN products p ON i.product_id = p.id
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(total)
    }

    /// Delete an aggregate; only allowed once its stock has been drawn down
    /// to zero
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let inventory = lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        if inventory.current_stock > 0 {
            return Err(AppError::Conflict(
                "Cannot delete inventory with current stock. Set stock to 0 first.".to_string(),
            ));
        }

        sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

// Row-level write helpers, restricted to the orchestrator's transactions.

/// Insert a new aggregate row
pub(crate) async fn insert(
    conn: &mut PgConnection,
    product_id: Uuid,
    current_stock: i32,
    min_stock: i32,
    max_stock: i32,
) -> AppResult<Inventory> {
    let row = sqlx::query_as::<_, Inventory>(
        r#"
        INSERT INTO inventory (product_id, current_stock, min_stock, max_stock)
        VALUES ($1, $2, $3, $4)
        RETURNING id, product_id, current_stock, min_stock, max_stock, last_updated
        "#,
    )
    .bind(product_id)
    .bind(current_stock)
    .bind(min_stock)
    .bind(max_stock)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

/// Lock the aggregate row by ID for the duration of the transaction
pub(crate) async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Inventory>> {
    let row = sqlx::query_as::<_, Inventory>(
        r#"
        SELECT id, product_id, current_stock, min_stock, max_stock, last_updated
        FROM inventory
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Lock the aggregate row by product for the duration of the transaction
pub(crate) async fn lock_by_product(
    conn: &mut PgConnection,
    product_id: Uuid,
) -> AppResult<Option<Inventory>> {
    let row = sqlx::query_as::<_, Inventory>(
        r#"
        SELECT id, product_id, current_stock, min_stock, max_stock, last_updated
        FROM inventory
        WHERE product_id = $1
        FOR UPDATE
        "#,
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Overwrite stock level fields on a locked aggregate row
pub(crate) async fn update_levels(
    conn: &mut PgConnection,
    id: Uuid,
    current_stock: i32,
    min_stock: i32,
    max_stock: i32,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE inventory
        SET current_stock = $1, min_stock = $2, max_stock = $3, last_updated = NOW()
        WHERE id = $4
        "#,
    )
    .bind(current_stock)
    .bind(min_stock)
    .bind(max_stock)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Set `current_stock` on a locked aggregate row
pub(crate) async fn set_current_stock(
    conn: &mut PgConnection,
    id: Uuid,
    current_stock: i32,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE inventory SET current_stock = $1, last_updated = NOW() WHERE id = $2",
    )
    .bind(current_stock)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}
