//! Route definitions for the Dentstock backend

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - inventory aggregates
        .nest("/inventory", inventory_routes())
        // Protected routes - stock movement ledger
        .nest("/stock-movements", stock_movement_routes())
}

/// Inventory aggregate routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_inventory).post(handlers::create_inventory),
        )
        // Aggregated views
        .route("/low-stock", get(handlers::get_low_stock))
        .route("/low-stock/summary", get(handlers::get_low_stock_summary))
        .route("/value", get(handlers::get_inventory_value))
        .route("/dashboard", get(handlers::get_dashboard_stats))
        .route(
            "/frequency/:frequency",
            get(handlers::get_inventory_by_frequency),
        )
        // Per-product paths
        .route(
            "/product/:product_id",
            get(handlers::get_inventory_by_product),
        )
        .route("/product/:product_id/adjust", post(handlers::adjust_stock))
        .route(
            "/product/:product_id/resync",
            post(handlers::resync_inventory),
        )
        // By aggregate id
        .route(
            "/:id",
            get(handlers::get_inventory).delete(handlers::delete_inventory),
        )
        .route("/:id/stock", put(handlers::update_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock movement ledger routes (protected)
fn stock_movement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movements).post(handlers::create_movement),
        )
        .route("/recent", get(handlers::get_recent_movements))
        // Analytics
        .route("/stats", get(handlers::get_movement_stats))
        .route("/usage-analytics", get(handlers::get_usage_analytics))
        .route("/cost-analysis", get(handlers::get_cost_analysis))
        // Admin maintenance
        .route("/bulk", post(handlers::bulk_create_movements))
        .route(
            "/product/:product_id",
            get(handlers::get_movements_by_product),
        )
        .route(
            "/:id",
            get(handlers::get_movement).delete(handlers::delete_movement),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
