//! Route definitions for the Branch Inventory Management API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - branch registry
        .nest("/branches", branch_routes())
        // Protected routes - product catalog
        .nest("/products", product_routes())
        // Protected routes - product catalog requests
        .nest("/product-requests", product_request_routes())
        // Protected routes - stock ledger
        .nest("/stock", stock_routes())
        // Protected routes - sales
        .nest("/sales", sale_routes())
        // Protected routes - transfers
        .nest("/transfers", transfer_routes())
}

/// Branch registry routes (protected)
fn branch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_branches).post(handlers::create_branch),
        )
        .route("/:branch_id", get(handlers::get_branch))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/:product_id", get(handlers::get_product))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product catalog request routes (protected)
fn product_request_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_requests).post(handlers::create_request),
        )
        .route("/:request_id", get(handlers::get_request))
        .route("/:request_id/approve", post(handlers::approve_request))
        .route("/:request_id/reject", post(handlers::reject_request))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/adjustments", post(handlers::record_adjustment))
        .route("/low", get(handlers::get_low_stock))
        .route("/branches/:branch_id", get(handlers::get_branch_stocks))
        .route(
            "/branches/:branch_id/products/:product_id",
            get(handlers::get_branch_stock),
        )
        .route(
            "/branches/:branch_id/products/:product_id/movements",
            get(handlers::get_movements),
        )
        .route(
            "/branches/:branch_id/products/:product_id/min-stock",
            axum::routing::put(handlers::set_min_stock),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sale routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route(
            "/:sale_id",
            get(handlers::get_sale).delete(handlers::cancel_sale),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Transfer workflow routes (protected)
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transfers).post(handlers::create_transfer),
        )
        .route(
            "/:transfer_id",
            get(handlers::get_transfer).delete(handlers::delete_transfer),
        )
        .route("/:transfer_id/approve", post(handlers::approve_transfer))
        .route("/:transfer_id/reject", post(handlers::reject_transfer))
        .route("/:transfer_id/send", post(handlers::send_transfer))
        .route("/:transfer_id/receive", post(handlers::receive_transfer))
        .route_layer(middleware::from_fn(auth_middleware))
}
