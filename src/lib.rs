pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod validation;

use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{CorsOrigins, PaymentSettings};
use crate::handlers::{applications, notifications, openapi::ApiDoc, payments};
use crate::ports::Repositories;
use crate::services::Services;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Present when running against Postgres; used by the health check.
    pub db: Option<sqlx::PgPool>,
}

impl AppState {
    pub fn new(repos: &Repositories, settings: &PaymentSettings, db: Option<sqlx::PgPool>) -> Self {
        Self {
            services: Services::new(repos, settings),
            db,
        }
    }
}

pub fn create_app(state: AppState, cors: &CorsOrigins) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/applications",
            post(applications::create_application).get(applications::list_my_applications),
        )
        .route("/applications/stats", get(applications::application_stats))
        .route(
            "/applications/received",
            get(applications::list_received_applications),
        )
        .route(
            "/applications/:id",
            get(applications::get_application).put(applications::update_application),
        )
        .route("/applications/:id/submit", post(applications::submit_application))
        .route("/applications/:id/approve", post(applications::approve_application))
        .route("/applications/:id/reject", post(applications::reject_application))
        .route("/applications/:id/review", post(applications::review_application))
        .route("/applications/:id/withdraw", post(applications::withdraw_application))
        .route(
            "/applications/:id/documents",
            get(applications::list_documents).post(applications::upload_document),
        )
        .route(
            "/applications/:id/documents/:doc_id",
            delete(applications::delete_document),
        )
        .route("/applications/:id/pay", post(payments::pay_application_fee))
        .route(
            "/franchises/:id/applications",
            get(applications::list_franchise_applications),
        )
        .route(
            "/payments/transactions",
            post(payments::create_transaction).get(payments::list_transactions),
        )
        .route("/payments/transactions/:id", get(payments::get_transaction))
        .route(
            "/payments/transactions/:id/status",
            put(payments::update_transaction_status),
        )
        .route(
            "/payments/requests",
            post(payments::create_payment_request).get(payments::list_payment_requests),
        )
        .route("/payments/requests/:id", get(payments::get_payment_request))
        .route("/payments/requests/:id/pay", post(payments::pay_payment_request))
        .route(
            "/payments/requests/:id/cancel",
            post(payments::cancel_payment_request),
        )
        .route("/payments/stats", get(payments::payment_stats))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(state)
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let parsed = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect::<Vec<_>>();
            layer.allow_origin(parsed)
        }
    }
}
