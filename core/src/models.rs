//! Records exchanged with the order API.
//!
//! Field names follow the remote PascalCase schema. Each record keeps
//! properties it does not model in `extra`, nulls included, so re-sending a
//! payload read from the service keeps every property it carried. Modelled
//! fields that are `None` are omitted on serialization: the service treats
//! an absent property like `null`, and an explicit `null` for a modelled
//! field does not survive a round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An order as stored by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    #[serde(rename = "BillBeeOrderId", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    /// Order state id, see the remote order state table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply to order creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderResult {
    #[serde(rename = "BillBeeOrderId", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Invoice data returned by the invoice listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(rename = "BillBeeOrderId", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_gross: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_net: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Only filled when positions were requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_note_number: Option<String>,
    #[serde(rename = "PDFDownloadUrl", skip_serializing_if = "Option::is_none")]
    pub pdf_download_url: Option<String>,
    /// Base64 encoded PDF, present when requested.
    #[serde(rename = "PDFData", skip_serializing_if = "Option::is_none")]
    pub pdf_data: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Invoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_gross: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_net: Option<f64>,
    #[serde(rename = "PDFDownloadUrl", skip_serializing_if = "Option::is_none")]
    pub pdf_download_url: Option<String>,
    /// Base64 encoded PDF, present when requested.
    #[serde(rename = "PDFData", skip_serializing_if = "Option::is_none")]
    pub pdf_data: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A shipment created in an external system, to be attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderShipment {
    /// Id assigned by the shipping provider.
    pub shipping_id: String,
    pub order_id: i64,
    pub comment: Option<String>,
    pub shipping_provider_id: Option<i64>,
    pub shipping_provider_product_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArticleCategory {
    pub name: String,
    pub id: Option<i64>,
}

/// Body of the tag calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TagUpdate {
    pub tags: Vec<String>,
}
