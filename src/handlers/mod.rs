use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    services::inventory_service::SharedInventoryService,
    ws::{DefaultMessageRouter, MessageRouter},
};

pub mod content;
pub mod ws;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub service: SharedInventoryService,
    pub message_router: Arc<dyn MessageRouter>,
}

impl AppState {
    pub fn new(service: SharedInventoryService) -> Self {
        let message_router = Arc::new(DefaultMessageRouter::new(service.clone()));

        Self {
            service,
            message_router,
        }
    }
}

/// Build the HTTP routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Bookstore inventory service is running." }))
        .route(
            "/content/{*address}",
            get(content::list)
                .post(content::create)
                .patch(content::modify)
                .delete(content::remove),
        )
        .route("/types/{*address}", get(content::describe))
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::support::open_service;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn book() -> Value {
        json!({
            "title": "Dune",
            "author": "Herbert",
            "price": 12.5,
            "quantity": 3,
            "supplier_name": "Ace",
            "supplier_phone": "555-0100"
        })
    }

    #[tokio::test]
    async fn crud_over_http() {
        let (_dir, service) = open_service().await;
        let app = router(AppState::new(service));
        let books = "/content/com.example.android.inventory/books";

        let (status, created) = call(&app, "POST", books, Some(book())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["address"], "com.example.android.inventory/books/1");

        let (status, rows) = call(&app, "GET", &format!("{}/1?columns=title,quantity", books), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rows, json!([{ "title": "Dune", "quantity": 3 }]));

        let (status, patched) = call(
            &app,
            "PATCH",
            &format!("{}/1", books),
            Some(json!({ "values": { "quantity": 2 } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["rows_affected"], 1);

        let (status, removed) = call(&app, "DELETE", &format!("{}/1", books), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removed["rows_affected"], 1);

        let (_, rows) = call(&app, "GET", books, None).await;
        assert_eq!(rows, json!([]));
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let (_dir, service) = open_service().await;
        let app = router(AppState::new(service));

        let (status, _) = call(&app, "GET", "/content/elsewhere/books", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut invalid = book();
        invalid["price"] = json!(-1.0);
        let (status, body) = call(
            &app,
            "POST",
            "/content/com.example.android.inventory/books",
            Some(invalid),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("price"));

        let (status, _) = call(
            &app,
            "POST",
            "/content/com.example.android.inventory/books/4",
            Some(book()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &app,
            "GET",
            "/content/com.example.android.inventory/books?sort=isbn",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_requests() {
        let (_dir, service) = open_service().await;
        let app = router(AppState::new(service));
        let books = "/content/com.example.android.inventory/books";

        let (status, body) = call(&app, "POST", books, Some(json!({ "isbn": "1" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("isbn"));

        let (status, body) = call(
            &app,
            "PATCH",
            books,
            Some(json!({ "values": { "quantity": "x" } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let request = Request::builder()
            .method("POST")
            .uri(books)
            .header("content-type", "application/json")
            .body(Body::from("{\"title\":"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());

        let (_, rows) = call(&app, "GET", books, None).await;
        assert_eq!(rows, json!([]));
    }

    #[tokio::test]
    async fn describes_address_types() {
        let (_dir, service) = open_service().await;
        let app = router(AppState::new(service));

        let (status, body) = call(&app, "GET", "/types/com.example.android.inventory/books/7", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "item");
        assert_eq!(
            body["mime_type"],
            "vnd.android.cursor.item/com.example.android.inventory/books"
        );

        let (status, _) = call(&app, "GET", "/types/com.example.android.inventory/books/x", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
