use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thing {
    pub id: Uuid,
    pub name: String,
    pub owner: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateThing {
    pub name: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// What `/echo` saw: method, headers (lower-cased names) and raw body text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Thing>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/api/v1/things", get(list_things).post(create_thing))
        .route(
            "/api/v1/thing/{id}",
            get(get_thing).post(claim_thing).delete(delete_thing),
        )
        .route("/echo", any(echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_things(State(db): State<Db>) -> Json<Vec<Thing>> {
    let things = db.read().await;
    Json(things.values().cloned().collect())
}

async fn create_thing(
    State(db): State<Db>,
    Json(input): Json<CreateThing>,
) -> (StatusCode, Json<Thing>) {
    let thing = Thing {
        id: Uuid::new_v4(),
        name: input.name,
        owner: None,
    };
    tracing::debug!(id = %thing.id, "created thing");
    db.write().await.insert(thing.id, thing.clone());
    (StatusCode::CREATED, Json(thing))
}

async fn get_thing(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Thing>, StatusCode> {
    let things = db.read().await;
    things.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Sets the thing's owner to the supplied login. An empty password is
/// rejected with 401.
async fn claim_thing(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<Credentials>,
) -> Result<Json<Thing>, StatusCode> {
    if input.password.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let mut things = db.write().await;
    let thing = things.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    thing.owner = Some(input.login);
    Ok(Json(thing.clone()))
}

async fn delete_thing(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut things = db.write().await;
    things.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        body,
    })
}
