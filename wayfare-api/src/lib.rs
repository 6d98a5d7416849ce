use axum::{http::Method, middleware::from_fn_with_state, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod activities;
pub mod admin;
pub mod assistant;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod extract;
pub mod invoices;
pub mod metrics;
pub mod middleware;
pub mod notifications;
pub mod password;
pub mod payments;
pub mod search;
pub mod state;
pub mod travel;
pub mod user_activity;

pub use state::AppState;

use middleware::{admin_auth_middleware, customer_auth_middleware};

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public = Router::new()
        .merge(auth::public_routes())
        .merge(travel::public_routes())
        .merge(activities::public_routes())
        .merge(search::public_routes())
        .merge(payments::public_routes())
        .route("/metrics", get(metrics::metrics_handler));

    let customer = Router::new()
        .merge(auth::routes())
        .merge(bookings::routes())
        .merge(travel::routes())
        .merge(payments::routes())
        .merge(invoices::routes())
        .merge(notifications::routes())
        .merge(activities::routes())
        .merge(user_activity::routes())
        .merge(assistant::routes())
        .route_layer(from_fn_with_state(state.clone(), customer_auth_middleware));

    let admin = admin::routes()
        .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .merge(public)
        .merge(customer)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
