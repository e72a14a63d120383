//! In-process fake of the expense API, bound to an ephemeral port.
#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};

pub const TOKEN: &str = "tok-123";
pub const PASSWORD: &str = "secret";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct FakeApi {
    requests: Mutex<Vec<Recorded>>,
    transactions: Mutex<Vec<Value>>,
    registered: Mutex<Option<Value>>,
    next_id: Mutex<u64>,
}

impl FakeApi {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last(&self, path: &str) -> Option<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.path == path)
            .cloned()
    }

    pub fn registered(&self) -> Option<Value> {
        self.registered.lock().unwrap().clone()
    }

    pub fn seed(&self, tx: Value) {
        self.transactions.lock().unwrap().push(tx);
    }

    pub fn stored(&self) -> Vec<Value> {
        self.transactions.lock().unwrap().clone()
    }
}

pub async fn spawn() -> (String, Arc<FakeApi>) {
    let api = Arc::new(FakeApi::default());
    let app = router(api.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), api)
}

pub fn expense(id: &str, amount: f64, category: &str, date: &str) -> Value {
    json!({
        "id": id,
        "user_id": "u1",
        "type": "expense",
        "amount": amount,
        "currency": "INR",
        "category": category,
        "description": null,
        "date": date,
    })
}

fn router(api: Arc<FakeApi>) -> Router {
    Router::new()
        .route("/auth/login", axum::routing::post(login))
        .route("/auth/register", axum::routing::post(register))
        .route("/transactions", get(list).post(create))
        .route("/transactions/categories", get(categories))
        .route(
            "/transactions/{id}",
            get(get_one).put(update).delete(remove),
        )
        .route("/summary", get(summary))
        .route(
            "/broken",
            get(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
        )
        .route(
            "/validation",
            get(|| async { (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"detail": []}))) }),
        )
        .layer(middleware::from_fn_with_state(api.clone(), record))
        .with_state(api)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn record(State(api): State<Arc<FakeApi>>, req: Request, next: Next) -> Response {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let path = req.uri().path().to_string();
    api.requests.lock().unwrap().push(Recorded {
        method: req.method().to_string(),
        path: path.clone(),
        query: req.uri().query().map(str::to_string),
        authorization: authorization.clone(),
    });

    let expected = format!("Bearer {TOKEN}");
    let protected = path.starts_with("/transactions") || path == "/summary";
    if protected && authorization.as_deref() != Some(expected.as_str()) {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    next.run(req).await
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == PASSWORD {
        Json(json!({ "access_token": TOKEN, "token_type": "bearer" })).into_response()
    } else {
        detail(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn register(State(api): State<Arc<FakeApi>>, Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        let errors = json!({
            "detail": [{ "loc": ["body", "email"], "msg": "Email already registered" }]
        });
        return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
    }
    *api.registered.lock().unwrap() = Some(body);
    Json(json!({ "access_token": TOKEN })).into_response()
}

fn in_month(tx: &Value, month: Option<&String>) -> bool {
    match month {
        Some(month) => tx["date"].as_str().is_some_and(|d| d.starts_with(month.as_str())),
        None => true,
    }
}

async fn list(
    State(api): State<Arc<FakeApi>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let month = params.get("month");
    let items = api
        .transactions
        .lock()
        .unwrap()
        .iter()
        .filter(|tx| in_month(tx, month))
        .cloned()
        .collect();
    Json(items)
}

async fn create(State(api): State<Arc<FakeApi>>, Json(mut body): Json<Value>) -> Json<Value> {
    let id = {
        let mut next = api.next_id.lock().unwrap();
        *next += 1;
        format!("new-{next}")
    };
    body["id"] = json!(id);
    body["user_id"] = json!("u1");
    api.transactions.lock().unwrap().push(body.clone());
    Json(body)
}

async fn get_one(State(api): State<Arc<FakeApi>>, Path(id): Path<String>) -> Response {
    api.transactions
        .lock()
        .unwrap()
        .iter()
        .find(|tx| tx["id"] == id.as_str())
        .map(|tx| Json(tx.clone()).into_response())
        .unwrap_or_else(|| detail(StatusCode::NOT_FOUND, "Transaction not found"))
}

async fn update(
    State(api): State<Arc<FakeApi>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut items = api.transactions.lock().unwrap();
    let Some(tx) = items.iter_mut().find(|tx| tx["id"] == id.as_str()) else {
        return detail(StatusCode::NOT_FOUND, "Transaction not found");
    };
    if let (Some(target), Some(patch)) = (tx.as_object_mut(), body.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(tx.clone()).into_response()
}

async fn remove(State(api): State<Arc<FakeApi>>, Path(id): Path<String>) -> Response {
    let mut items = api.transactions.lock().unwrap();
    let before = items.len();
    items.retain(|tx| tx["id"] != id.as_str());
    if items.len() == before {
        return detail(StatusCode::NOT_FOUND, "Transaction not found");
    }
    Json(json!({ "message": "Transaction deleted" })).into_response()
}

async fn categories() -> Json<Value> {
    Json(json!({ "categories": ["Food", "Books"] }))
}

async fn summary(
    State(api): State<Arc<FakeApi>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let month = params.get("month");
    let mut income = 0.0;
    let mut expense = 0.0;
    let mut breakdown: BTreeMap<String, f64> = BTreeMap::new();
    for tx in api.transactions.lock().unwrap().iter() {
        if !in_month(tx, month) {
            continue;
        }
        let amount = tx["amount"].as_f64().unwrap_or_default();
        let category = tx["category"].as_str().unwrap_or_default().to_string();
        if tx["type"] == "income" {
            income += amount;
        } else {
            expense += amount;
            *breakdown.entry(category).or_default() += amount;
        }
    }
    Json(json!({
        "total_income": income,
        "total_expense": expense,
        "balance": income - expense,
        "category_breakdown": breakdown,
    }))
}
