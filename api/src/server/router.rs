use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{handle_errors, handle_panic, parse_json_body};
use crate::AppState;

/// Build the application router.
///
/// Requests pass trace → CORS → error handler → panic catcher → JSON parsing
/// → route. The error handler wraps everything after CORS, so JSON parse
/// errors, unmatched routes, handler errors and panics all end up there, and
/// CORS headers are applied to error responses too.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/users", handlers::users::routes())
        .route("/api/users/", handlers::users::collection())
        // `/*rest` never matches an empty segment, so the trailing slash needs its own route
        .route("/api/products", any(handlers::products))
        .route("/api/products/", any(handlers::products))
        .route("/api/products/*rest", any(handlers::products))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(parse_json_body))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(
            state.errors.clone(),
            handle_errors,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::ports::MockUserRepository;
    use crate::handlers::products::PRODUCTS_MESSAGE;
    use crate::test_utils::{test_state, test_user, InMemoryUserRepository};

    fn app() -> (Router, AppState) {
        let state = test_state(Arc::new(
            InMemoryUserRepository::new().with_user(test_user("ada")),
        ));
        (build_router(state.clone()), state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn products_returns_fixed_message() {
        let (router, _) = app();
        let server = TestServer::new(router).unwrap();

        let response = server
            .get("/api/products")
            .add_query_param("page", "2")
            .add_header(
                header::ACCEPT_LANGUAGE,
                header::HeaderValue::from_static("fr"),
            )
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "message": PRODUCTS_MESSAGE }));
    }

    #[tokio::test]
    async fn products_answers_any_method_and_sub_path() {
        for (method, uri) in [
            (Method::POST, "/api/products"),
            (Method::DELETE, "/api/products"),
            (Method::GET, "/api/products/"),
            (Method::GET, "/api/products/42/reviews"),
            (Method::PATCH, "/api/products/anything"),
        ] {
            let (router, _) = app();
            let response = router
                .oneshot(
                    Request::builder()
                        .method(method.clone())
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{} {}", method, uri);
            assert_eq!(body_json(response).await["message"], PRODUCTS_MESSAGE);
        }
    }

    #[tokio::test]
    async fn cors_headers_on_every_response() {
        for uri in ["/api/products", "/api/users", "/no/such/route"] {
            let (router, _) = app();
            let response = router
                .oneshot(
                    Request::get(uri)
                        .header(header::ORIGIN, "https://shop.example.org")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(
                response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
                "*",
                "{}",
                uri
            );
        }
    }

    #[tokio::test]
    async fn cors_preflight_is_permissive() {
        let (router, _) = app();
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/users")
                    .header(header::ORIGIN, "https://elsewhere.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-custom")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    }

    #[tokio::test]
    async fn unmatched_path_is_json_404() {
        let (router, state) = app();
        let response = router
            .oneshot(Request::get("/api/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Not found");
        assert_eq!(body["details"], "Cannot GET /api/orders");
        assert_eq!(state.errors.get(), 1);
    }

    #[tokio::test]
    async fn malformed_json_reaches_error_handler_once() {
        // The repository must never be called
        let repo = MockUserRepository::new();
        let state = test_state(Arc::new(repo));
        let router = build_router(state.clone());

        let response = router
            .oneshot(
                Request::post("/api/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name": "ada", "email": "#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let body = body_json(response).await;
        assert_eq!(body["error"], "Malformed JSON body");
        assert_eq!(state.errors.get(), 1);
    }

    #[tokio::test]
    async fn wrong_shape_is_rendered_uniformly() {
        let (router, state) = app();
        let response = router
            .oneshot(
                Request::post("/api/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name": "ada"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unprocessable Entity");
        assert!(body["details"].as_str().unwrap().contains("email"));
        assert_eq!(state.errors.get(), 1);
    }

    #[tokio::test]
    async fn user_requests_are_forwarded_intact() {
        let (router, _) = app();
        let server = TestServer::new(router).unwrap();

        let created = server
            .post("/api/users")
            .json(&json!({"name": "grace", "email": "grace@example.com"}))
            .await;
        created.assert_status(StatusCode::CREATED);
        let created: Value = created.json();
        assert_eq!(created["name"], "grace");
        assert_eq!(created["email"], "grace@example.com");

        let listed: Vec<Value> = server
            .get("/api/users")
            .add_query_param("email", "grace@example.com")
            .await
            .json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn users_collection_answers_with_trailing_slash() {
        let (router, _) = app();
        let response = router
            .oneshot(Request::get("/api/users/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["name"], "ada");
    }

    #[tokio::test]
    async fn health_reports_phase_and_database() {
        let (router, state) = app();
        state
            .lifecycle
            .advance(crate::server::Phase::Listening)
            .unwrap();
        let server = TestServer::new(router).unwrap();

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["phase"], "listening");
        assert_eq!(body["database"], "open");
    }
}
