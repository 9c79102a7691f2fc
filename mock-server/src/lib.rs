//! In-memory stand-in for the Mapbox tokens API.
//!
//! Implements the slice of `https://api.mapbox.com` the client talks to:
//! `POST`/`GET` on `/tokens/v2/{username}` and `PATCH`/`DELETE` on
//! `/tokens/v2/{username}/{id}`. Every route requires the `access_token`
//! query parameter; failures answer with the same error envelope the real
//! service uses, so error-classification paths can be exercised end to end.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub note: String,
    #[serde(default)]
    pub allowed_urls: Vec<String>,
    pub id: Option<String>,
    pub scopes: Vec<String>,
    pub token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateToken {
    pub note: String,
    pub scopes: Vec<String>,
    #[serde(default)]
    pub allowed_urls: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateToken {
    pub note: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub allowed_urls: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct AuthParams {
    access_token: Option<String>,
}

/// A stored record remembers which user created it so lookups under the
/// wrong username miss.
#[derive(Clone, Debug)]
struct Stored {
    username: String,
    record: Token,
}

type Db = Arc<RwLock<HashMap<String, Stored>>>;

type Reply = (StatusCode, Json<Value>);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/tokens/v2/{username}", get(list_tokens).post(create_token))
        .route(
            "/tokens/v2/{username}/{id}",
            patch(update_token).delete(delete_token),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error_reply(status: StatusCode, message: &str, kind: &str) -> Reply {
    (
        status,
        Json(json!({ "error": { "message": message }, "type": kind })),
    )
}

fn require_token(auth: &AuthParams) -> Result<(), Reply> {
    match auth.access_token.as_deref() {
        Some(token) if !token.is_empty() => Ok(()),
        _ => Err(error_reply(
            StatusCode::UNAUTHORIZED,
            "no access token provided",
            "unauthorized",
        )),
    }
}

async fn list_tokens(
    State(db): State<Db>,
    Path(username): Path<String>,
    Query(auth): Query<AuthParams>,
) -> Result<Json<Vec<Token>>, Reply> {
    require_token(&auth)?;
    let tokens = db.read().await;
    let records = tokens
        .values()
        .filter(|stored| stored.username == username)
        .map(|stored| stored.record.clone())
        .collect();
    Ok(Json(records))
}

async fn create_token(
    State(db): State<Db>,
    Path(username): Path<String>,
    Query(auth): Query<AuthParams>,
    Json(input): Json<CreateToken>,
) -> Result<Json<Token>, Reply> {
    require_token(&auth)?;
    let id = Uuid::new_v4().simple().to_string();
    let record = Token {
        note: input.note,
        allowed_urls: input.allowed_urls,
        id: Some(id.clone()),
        scopes: input.scopes,
        token: Some(format!("pk.{}", Uuid::new_v4().simple())),
    };
    debug!(%username, %id, "created token");
    db.write().await.insert(
        id,
        Stored {
            username,
            record: record.clone(),
        },
    );
    // The real service answers 200 on create, not 201.
    Ok(Json(record))
}

async fn update_token(
    State(db): State<Db>,
    Path((username, id)): Path<(String, String)>,
    Query(auth): Query<AuthParams>,
    Json(input): Json<UpdateToken>,
) -> Result<Json<Token>, Reply> {
    require_token(&auth)?;
    let mut tokens = db.write().await;
    let stored = tokens
        .get_mut(&id)
        .filter(|stored| stored.username == username)
        .ok_or_else(|| error_reply(StatusCode::NOT_FOUND, "token not found", "token_not_found"))?;
    if let Some(note) = input.note {
        stored.record.note = note;
    }
    if let Some(scopes) = input.scopes {
        stored.record.scopes = scopes;
    }
    if let Some(allowed_urls) = input.allowed_urls {
        stored.record.allowed_urls = allowed_urls;
    }
    debug!(%username, %id, "updated token");
    Ok(Json(stored.record.clone()))
}

async fn delete_token(
    State(db): State<Db>,
    Path((username, id)): Path<(String, String)>,
    Query(auth): Query<AuthParams>,
) -> Result<StatusCode, Reply> {
    require_token(&auth)?;
    let mut tokens = db.write().await;
    match tokens.get(&id) {
        Some(stored) if stored.username == username => {
            tokens.remove(&id);
            debug!(%username, %id, "deleted token");
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(error_reply(
            StatusCode::NOT_FOUND,
            "token not found",
            "token_not_found",
        )),
    }
}
