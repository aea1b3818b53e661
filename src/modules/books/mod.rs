pub mod models;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use catalog_db::CatalogEntry;
use catalog_http::error::AppError;
use catalog_kernel::{InitCtx, Module};
use serde_json::json;
use uuid::Uuid;

use crate::moderation::ModerationQueue;
use models::{ApproveResponse, BookQuery, SubmitBook, SubmitResponse};

/// Public catalog and the moderation endpoints
pub struct BooksModule {
    queue: ModerationQueue,
}

impl BooksModule {
    pub fn new(queue: ModerationQueue) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books))
            .route("/submit", post(submit_book))
            .route("/admin/pending", get(list_pending))
            .route("/admin/approve/{id}", post(approve_book))
            .route("/health", get(health_check))
            .with_state(self.queue.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_list = json!({
            "description": "Catalog entries",
            "content": {
                "application/json": {
                    "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                }
            }
        });
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List approved books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "search", "in": "query", "schema": { "type": "string" },
                              "description": "Case-insensitive title substring" },
                            { "name": "genre", "in": "query", "schema": { "type": "string" } },
                            { "name": "publisher", "in": "query", "schema": { "type": "string" } }
                        ],
                        "responses": { "200": book_list, "500": error("Internal server error") }
                    }
                },
                "/submit": {
                    "post": {
                        "summary": "Submit a book for review",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/SubmitBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Queued for moderation" },
                            "422": error("Validation error")
                        }
                    }
                },
                "/admin/pending": {
                    "get": {
                        "summary": "List books awaiting approval",
                        "tags": ["Moderation"],
                        "responses": { "200": book_list }
                    }
                },
                "/admin/approve/{id}": {
                    "post": {
                        "summary": "Approve a pending book",
                        "tags": ["Moderation"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true,
                              "schema": { "type": "string", "format": "uuid" } }
                        ],
                        "responses": {
                            "200": { "description": "Approved" },
                            "400": error("Malformed id"),
                            "404": error("Unknown book")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": { "200": { "description": "OK" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "array", "items": { "type": "string" } },
                            "publisher": { "type": "string" },
                            "release_date": { "type": "string", "format": "date", "nullable": true },
                            "blurb": { "type": "string" },
                            "cover_url": { "type": "string", "format": "uri", "nullable": true },
                            "status": { "type": "string", "enum": ["pending", "approved"] },
                            "created_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "title", "author", "genre", "publisher", "blurb", "status", "created_at"]
                    },
                    "SubmitBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "array", "items": { "type": "string" } },
                            "publisher": { "type": "string" },
                            "release_date": { "type": "string", "format": "date" },
                            "blurb": { "type": "string" },
                            "cover_url": { "type": "string", "format": "uri" }
                        },
                        "required": ["title"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(
    State(queue): State<ModerationQueue>,
    Query(query): Query<BookQuery>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    Ok(Json(queue.approved(query.into_filter()).await?))
}

async fn submit_book(
    State(queue): State<ModerationQueue>,
    Json(submission): Json<SubmitBook>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let problems = submission.validate();
    if !problems.is_empty() {
        return Err(AppError::validation(problems, "submission is incomplete"));
    }

    let entry = queue.enqueue(submission.into_draft()).await?;
    tracing::info!(id = %entry.id, title = %entry.title, "public submission queued");

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id: entry.id,
            message: "Book submitted for review.",
        }),
    ))
}

async fn list_pending(
    State(queue): State<ModerationQueue>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    Ok(Json(queue.pending().await?))
}

async fn approve_book(
    State(queue): State<ModerationQueue>,
    Path(id): Path<String>,
) -> Result<Json<ApproveResponse>, AppError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::bad_request(format!("'{id}' is not a valid book id")))?;
    let book = queue.approve(id).await?;

    Ok(Json(ApproveResponse {
        message: "Book approved.",
        book,
    }))
}

pub fn create_module(queue: ModerationQueue) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(queue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use catalog_db::{CatalogStore, EntryDraft, MemoryStore, Status};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn setup() -> (Router, ModerationQueue) {
        let queue = ModerationQueue::new(Arc::new(MemoryStore::new()));
        (BooksModule::new(queue.clone()).routes(), queue)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn submission_is_pending_until_approved() {
        let (router, _) = setup();

        let (status, body) = send(
            &router,
            post_json(
                "/submit",
                json!({
                    "title": "The Chosen",
                    "author": "Chaim Potok",
                    "genre": ["fiction", " "],
                    "release_date": "1967-04-28",
                    "status": "approved"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_str().unwrap().to_string();

        let (_, listing) = send(&router, get("/")).await;
        assert_eq!(listing, json!([]));

        let (_, pending) = send(&router, get("/admin/pending")).await;
        assert_eq!(pending[0]["status"], "pending");
        assert_eq!(pending[0]["genre"], json!(["fiction"]));

        let (status, approved) =
            send(&router, post_json(&format!("/admin/approve/{id}"), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["book"]["status"], "approved");

        let (_, listing) = send(&router, get("/")).await;
        assert_eq!(listing[0]["title"], "The Chosen");
        let (_, pending) = send(&router, get("/admin/pending")).await;
        assert_eq!(pending, json!([]));
    }

    #[tokio::test]
    async fn submission_without_title_is_rejected() {
        let (router, queue) = setup();
        let (status, body) = send(&router, post_json("/submit", json!({"author": "Anon"}))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["details"][0]["field"], "title");
        assert!(queue.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn approve_reports_bad_and_unknown_ids() {
        let (router, _) = setup();

        let (status, _) = send(&router, post_json("/admin/approve/not-a-uuid", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &router,
            post_json(&format!("/admin/approve/{}", Uuid::now_v7()), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn listing_filters_approved_books() {
        let (router, queue) = setup();
        for (title, genre, publisher) in [
            ("Jewish Folk Tales", "folklore", "Crown"),
            ("Hebrew Poetry", "poetry", "JPS"),
            ("Yiddish Folk Songs", "folklore", "JPS"),
        ] {
            let entry = queue
                .enqueue(EntryDraft {
                    title: title.to_string(),
                    genre: [genre.to_string()].into(),
                    publisher: publisher.to_string(),
                    ..EntryDraft::default()
                })
                .await
                .unwrap();
            queue.approve(entry.id).await.unwrap();
        }
        queue
            .store()
            .insert(catalog_db::CatalogEntry::pending(EntryDraft {
                title: "Unreviewed Folk Tales".to_string(),
                ..EntryDraft::default()
            }))
            .await
            .unwrap();

        let titles = |body: serde_json::Value| -> Vec<String> {
            body.as_array()
                .unwrap()
                .iter()
                .map(|book| book["title"].as_str().unwrap().to_string())
                .collect()
        };

        let (_, body) = send(&router, get("/?search=folk")).await;
        assert_eq!(titles(body), ["Jewish Folk Tales", "Yiddish Folk Songs"]);

        let (_, body) = send(&router, get("/?genre=folklore&publisher=JPS")).await;
        assert_eq!(titles(body), ["Yiddish Folk Songs"]);

        let (_, body) = send(&router, get("/?search=&genre=")).await;
        assert_eq!(titles(body).len(), 3);

        let all = queue.store().find(&Default::default()).await.unwrap();
        assert_eq!(all.iter().filter(|e| e.status == Status::Pending).count(), 1);
    }
}
