mod admin;
mod health;
mod login;
mod orders;
mod products;
mod register;
mod upload;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::{
    AppState,
    middleware::{admin_middleware, auth_middleware},
};

pub fn create_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(health::api_info))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/register", post(register::register_user))
        .route("/auth/login", post(login::login_user))
        .route("/products", get(products::list_products))
        .route("/products/featured", get(products::list_featured))
        .route("/products/best-sellers", get(products::list_best_sellers))
        .route("/products/{slug}", get(products::get_product_by_slug));

    let authenticated = Router::new()
        .route("/auth/me", get(login::current_user))
        .route("/orders", post(orders::create_order))
        .route("/orders/myorders", get(orders::get_my_orders))
        .route("/orders/{id}", get(orders::get_order_by_id))
        .route("/orders/{id}/pay", put(orders::mark_order_paid))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin = Router::new()
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}/status", put(orders::update_order_status))
        .route(
            "/products/admin",
            get(products::list_admin_products).post(products::create_product),
        )
        .route(
            "/products/admin/{id}",
            get(products::get_admin_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/admin/stats", get(admin::get_stats))
        .route("/admin/latest-orders", get(admin::latest_orders))
        .route("/admin/orders", get(orders::list_orders))
        .route("/admin/orders/{id}/status", put(orders::update_order_status))
        .route("/upload", post(upload::upload_image))
        .route_layer(middleware::from_fn_with_state(state, admin_middleware));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
}
