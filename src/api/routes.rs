//! API Routes
//!
//! Configures the Axum router with all listing service endpoints.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{
    create_checkout_handler, delete_checkout_handler, get_checkout_handler, health_handler,
    list_checkouts_handler, stats_handler, update_status_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /tenants/:tenant/checkouts` - Create a checkout
/// - `GET /tenants/:tenant/checkouts` - List a page of checkouts
/// - `GET /tenants/:tenant/checkouts/:id` - Fetch one checkout
/// - `PATCH /tenants/:tenant/checkouts/:id` - Change a checkout's status
/// - `DELETE /tenants/:tenant/checkouts/:id` - Delete a checkout
/// - `GET /stats` - List cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
/// - Timeout: Requests running past `request_timeout` get 408
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/tenants/:tenant/checkouts",
            post(create_checkout_handler).get(list_checkouts_handler),
        )
        .route(
            "/tenants/:tenant/checkouts/:id",
            get(get_checkout_handler)
                .patch(update_status_handler)
                .delete(delete_checkout_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let state = AppState::from_config(&Config::default());
        create_router(state, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_empty_tenant() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/tenants/t1/checkouts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_endpoint() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tenants/t1/checkouts")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"cart_id":"c1","customer_id":"u1","currency":"usd"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/tenants/t1/checkouts/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
