//! In-memory fake of the Billbee order API.
//!
//! Serves the order routes below `/api/v1`, wraps every reply in the
//! service's envelope and reports unknown orders as `200` envelopes with an
//! `ErrorMessage`, like the real service does. Requests without the expected
//! API key get a bare `401`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const API_KEY: &str = "test-api-key";
pub const API_KEY_HEADER: &str = "x-billbee-api-key";

#[derive(Debug, Default)]
pub struct Store {
    pub orders: BTreeMap<i64, Value>,
    next_id: i64,
}

impl Store {
    pub fn insert(&mut self, mut order: Map<String, Value>) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        order.insert("BillBeeOrderId".to_string(), json!(id));
        self.orders.insert(id, Value::Object(order));
        id
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Db::default())
}

pub fn app_with(db: Db) -> Router {
    let orders = Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/invoices", get(list_invoices))
        .route("/orders/findbyextref/{id}", get(find_by_ext_ref))
        .route("/orders/find/{id}/{partner}", get(find_by_ext_ref_and_partner))
        .route("/orders/CreateDeliveryNote/{id}", post(create_delivery_note))
        .route("/orders/CreateInvoice/{id}", post(create_invoice))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/tags", post(add_tags).put(replace_tags))
        .route("/orders/{id}/shipment", post(add_shipment))
        .layer(middleware::from_fn(require_api_key))
        .with_state(db);
    Router::new().nest("/api/v1", orders)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_api_key(request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    let has_basic_auth = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if key != Some(API_KEY) || !has_basic_auth {
        tracing::warn!(path = %request.uri().path(), "rejecting unauthenticated request");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

fn envelope(data: Value) -> Json<Value> {
    Json(json!({
        "Paging": null,
        "ErrorMessage": null,
        "ErrorCode": 0,
        "ErrorDescription": null,
        "Data": data,
    }))
}

fn rejection(message: &str) -> Json<Value> {
    Json(json!({
        "Paging": null,
        "ErrorMessage": message,
        "ErrorCode": 0,
        "ErrorDescription": null,
        "Data": null,
    }))
}

fn not_found() -> Json<Value> {
    rejection("Order not found")
}

fn paged(items: Vec<Value>, page: usize, page_size: usize) -> Json<Value> {
    let total_rows = items.len();
    let total_pages = total_rows.div_ceil(page_size);
    let data: Vec<Value> = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    Json(json!({
        "Paging": {
            "Page": page,
            "TotalPages": total_pages,
            "TotalRows": total_rows,
            "PageSize": page_size,
        },
        "ErrorMessage": null,
        "ErrorCode": 0,
        "ErrorDescription": null,
        "Data": data,
    }))
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

type Pairs = Vec<(String, String)>;

fn single<'a>(pairs: &'a Pairs, name: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

/// Values of `name[0]`, `name[1]`, ... in index order.
fn indexed(pairs: &Pairs, name: &str) -> Vec<String> {
    let prefix = format!("{name}[");
    let mut found: Vec<(usize, String)> = pairs
        .iter()
        .filter_map(|(k, v)| {
            let index = k.strip_prefix(&prefix)?.strip_suffix(']')?.parse().ok()?;
            Some((index, v.clone()))
        })
        .collect();
    found.sort_by_key(|(i, _)| *i);
    found.into_iter().map(|(_, v)| v).collect()
}

fn flag(pairs: &Pairs, name: &str) -> bool {
    single(pairs, name) == Some("True")
}

fn paging(pairs: &Pairs) -> Result<(usize, usize), Json<Value>> {
    let page = single(pairs, "page").and_then(|v| v.parse::<usize>().ok());
    let page_size = single(pairs, "pageSize").and_then(|v| v.parse::<usize>().ok());
    match (page, page_size) {
        (Some(page), Some(size)) if page >= 1 && (1..=250).contains(&size) => Ok((page, size)),
        _ => Err(rejection("page and pageSize are required")),
    }
}

fn matches_filters(order: &Value, pairs: &Pairs) -> bool {
    let shops = indexed(pairs, "shopId");
    if !shops.is_empty() {
        let shop = order["ShopId"].as_i64().map(|s| s.to_string());
        if !shop.is_some_and(|s| shops.contains(&s)) {
            return false;
        }
    }
    let states = indexed(pairs, "orderStateId");
    if !states.is_empty() {
        let state = order["State"].as_i64().map(|s| s.to_string());
        if !state.is_some_and(|s| states.contains(&s)) {
            return false;
        }
    }
    let tags = indexed(pairs, "tag");
    if !tags.is_empty() {
        let order_tags = order["Tags"].as_array().cloned().unwrap_or_default();
        if !order_tags
            .iter()
            .filter_map(Value::as_str)
            .any(|t| tags.iter().any(|wanted| wanted == t))
        {
            return false;
        }
    }
    if let Some(min_id) = single(pairs, "minimumBillBeeOrderId").and_then(|v| v.parse::<i64>().ok()) {
        if order["BillBeeOrderId"].as_i64().unwrap_or_default() < min_id {
            return false;
        }
    }
    true
}

fn parse_id(id: &str) -> Option<i64> {
    id.parse().ok()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_orders(State(db): State<Db>, Query(pairs): Query<Pairs>) -> Json<Value> {
    let (page, page_size) = match paging(&pairs) {
        Ok(p) => p,
        Err(rejected) => return rejected,
    };
    let store = db.read().await;
    let items = store
        .orders
        .values()
        .filter(|o| matches_filters(o, &pairs))
        .cloned()
        .collect();
    paged(items, page, page_size)
}

async fn list_invoices(State(db): State<Db>, Query(pairs): Query<Pairs>) -> Json<Value> {
    let (page, page_size) = match paging(&pairs) {
        Ok(p) => p,
        Err(rejected) => return rejected,
    };
    let include_positions = flag(&pairs, "includePositions");
    let store = db.read().await;
    let items = store
        .orders
        .values()
        .filter(|o| o.get("InvoiceNumber").is_some())
        .filter(|o| matches_filters(o, &pairs))
        .map(|o| {
            let mut invoice = json!({
                "InvoiceNumber": o["InvoiceNumber"],
                "OrderNumber": o["OrderNumber"],
                "BillBeeOrderId": o["BillBeeOrderId"],
                "TotalGross": o["TotalCost"],
            });
            if include_positions {
                invoice["Positions"] = o.get("OrderItems").cloned().unwrap_or_else(|| json!([]));
            }
            invoice
        })
        .collect();
    paged(items, page, page_size)
}

async fn get_order(State(db): State<Db>, Path(id): Path<String>) -> Json<Value> {
    let store = db.read().await;
    match parse_id(&id).and_then(|id| store.orders.get(&id)) {
        Some(order) => envelope(order.clone()),
        None => not_found(),
    }
}

async fn find_by_ext_ref(State(db): State<Db>, Path(id): Path<String>) -> Json<Value> {
    let store = db.read().await;
    let found = store.orders.values().find(|o| o["OrderNumber"] == id.as_str());
    match found {
        Some(order) => envelope(order.clone()),
        None => not_found(),
    }
}

async fn find_by_ext_ref_and_partner(
    State(db): State<Db>,
    Path((id, partner)): Path<(String, String)>,
) -> Json<Value> {
    let store = db.read().await;
    let found = store
        .orders
        .values()
        .find(|o| o["OrderNumber"] == id.as_str() && o["Partner"] == partner.as_str());
    match found {
        Some(order) => envelope(order.clone()),
        None => not_found(),
    }
}

async fn create_order(
    State(db): State<Db>,
    Query(pairs): Query<Pairs>,
    Json(input): Json<Value>,
) -> Json<Value> {
    let Value::Object(mut order) = input else {
        return rejection("Order must be an object");
    };
    let has_number = order
        .get("OrderNumber")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.is_empty());
    if !has_number {
        return rejection("OrderNumber is required");
    }
    if let Some(shop) = single(&pairs, "shopId").and_then(|v| v.parse::<i64>().ok()) {
        order.insert("ShopId".to_string(), json!(shop));
    }
    let number = order["OrderNumber"].clone();
    let id = db.write().await.insert(order);
    tracing::debug!(id, "order created");
    envelope(json!({ "BillBeeOrderId": id, "OrderNumber": number }))
}

async fn update_tags(db: Db, id: &str, input: Value, replace: bool) -> Json<Value> {
    let Some(tags) = input.get("Tags").and_then(Value::as_array).cloned() else {
        return rejection("Tags are required");
    };
    let mut store = db.write().await;
    let Some(order) = parse_id(id).and_then(|id| store.orders.get_mut(&id)) else {
        return not_found();
    };
    let mut current = if replace {
        Vec::new()
    } else {
        order["Tags"].as_array().cloned().unwrap_or_default()
    };
    for tag in tags {
        if !current.contains(&tag) {
            current.push(tag);
        }
    }
    order["Tags"] = Value::Array(current.clone());
    envelope(json!({ "Tags": current }))
}

async fn add_tags(State(db): State<Db>, Path(id): Path<String>, Json(input): Json<Value>) -> Json<Value> {
    update_tags(db, &id, input, false).await
}

async fn replace_tags(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> Json<Value> {
    update_tags(db, &id, input, true).await
}

/// Answers with an empty `200` on success.
async fn add_shipment(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(shipment): Json<Value>,
) -> Response {
    let mut store = db.write().await;
    let Some(order) = parse_id(&id).and_then(|id| store.orders.get_mut(&id)) else {
        return not_found().into_response();
    };
    if shipment["OrderId"].as_i64() != parse_id(&id) {
        return rejection("OrderId does not match the path").into_response();
    }
    match order.as_object_mut() {
        Some(fields) => {
            let shipments = fields.entry("Shipments").or_insert_with(|| json!([]));
            if let Some(list) = shipments.as_array_mut() {
                list.push(shipment);
            }
            StatusCode::OK.into_response()
        }
        None => rejection("Order is corrupt").into_response(),
    }
}

async fn create_delivery_note(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(pairs): Query<Pairs>,
) -> Json<Value> {
    let store = db.read().await;
    let Some(order) = parse_id(&id).and_then(|id| store.orders.get(&id)) else {
        return not_found();
    };
    let mut note = json!({
        "OrderNumber": order["OrderNumber"],
        "DeliveryNoteNumber": format!("LS-{id}"),
        "PDFDownloadUrl": format!("https://files.example.invalid/delivery-notes/{id}.pdf"),
    });
    if flag(&pairs, "includePdf") {
        note["PDFData"] = json!("JVBERi0xLjQK");
    }
    envelope(note)
}

async fn create_invoice(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(pairs): Query<Pairs>,
) -> Json<Value> {
    let mut store = db.write().await;
    let Some(order) = parse_id(&id).and_then(|id| store.orders.get_mut(&id)) else {
        return not_found();
    };
    let number = format!("RE-{id}");
    order["InvoiceNumber"] = json!(number);
    let mut invoice = json!({
        "OrderNumber": order["OrderNumber"],
        "InvoiceNumber": number,
        "TotalGross": order["TotalCost"],
        "PDFDownloadUrl": format!("https://files.example.invalid/invoices/{id}.pdf"),
    });
    if flag(&pairs, "includeInvoicePdf") {
        invoice["PDFData"] = json!("JVBERi0xLjQK");
    }
    envelope(invoice)
}
