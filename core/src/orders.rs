//! Order endpoints.
//!
//! Each operation has a pure target constructor (`get_order`, `post_new_order`,
//! ...) that validates its arguments and describes the call, and a method of
//! the same name on [`OrderEndpoint`] that sends it. Hosts that run their own
//! HTTP stack can use the constructors with [`BillbeeClient::prepare`].

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::client::BillbeeClient;
use crate::envelope::{Envelope, List, Record, Untyped, Void};
use crate::error::ApiError;
use crate::filters::{InvoiceListFilter, OrderListFilter};
use crate::http::Transport;
use crate::models::{DeliveryNote, Invoice, InvoiceDetail, Order, OrderResult, OrderShipment, TagUpdate};
use crate::params::CallParams;
use crate::target::Target;

/// RFC 3986 unreserved characters stay as they are; everything else in an
/// identifier is percent-encoded.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn required<'a>(what: &str, value: &'a str) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!("{what} must not be empty")));
    }
    Ok(value)
}

/// Encode an identifier as a single path segment. A `/` is refused rather
/// than encoded: routers disagree on whether `%2F` splits a segment. `.` and
/// `..` would be collapsed by URL normalization.
fn path_segment(what: &str, value: &str) -> Result<String, ApiError> {
    let value = required(what, value)?;
    if value.contains('/') || value == "." || value == ".." {
        return Err(ApiError::invalid(format!("{what} {value:?} is not a valid path segment")));
    }
    Ok(utf8_percent_encode(value, SEGMENT).to_string())
}

fn order_id(id: i64) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::invalid(format!("order id must be positive, got {id}")));
    }
    Ok(id)
}

pub fn get_order(id: &str) -> Result<Target<Record<Order>>, ApiError> {
    let id = path_segment("order id", id)?;
    Ok(Target::get(format!("/orders/{id}")))
}

pub fn get_order_by_external_reference(id: &str) -> Result<Target<Record<Order>>, ApiError> {
    let id = path_segment("external reference", id)?;
    Ok(Target::get(format!("/orders/findbyextref/{id}")))
}

pub fn get_order_by_external_reference_and_partner(
    partner: &str,
    id: &str,
) -> Result<Target<Record<Order>>, ApiError> {
    let partner = path_segment("partner", partner)?;
    let id = path_segment("external reference", id)?;
    Ok(Target::get(format!("/orders/find/{id}/{partner}")))
}

pub fn get_order_list(filter: &OrderListFilter) -> Result<Target<List<Order>>, ApiError> {
    Ok(Target::get("/orders").with_params(filter.to_params()?))
}

pub fn get_invoice_list(filter: &InvoiceListFilter) -> Result<Target<List<InvoiceDetail>>, ApiError> {
    Ok(Target::get("/orders/invoices").with_params(filter.to_params()?))
}

/// `shop_id` attaches the order directly to a shop connection.
pub fn post_new_order(order: &Order, shop_id: Option<i64>) -> Result<Target<Record<OrderResult>>, ApiError> {
    let mut params = CallParams::new();
    params.push_opt("shopId", shop_id);
    Target::post("/orders").with_params(params).with_json(order)
}

/// Adds `tags` to those already on the order.
pub fn add_tags(tags: &[String], id: i64) -> Result<Target<Untyped>, ApiError> {
    let id = order_id(id)?;
    Target::post(format!("/orders/{id}/tags")).with_json(&TagUpdate {
        tags: tags.to_vec(),
    })
}

/// Replaces every tag on the order with `tags`.
pub fn update_tags(tags: &[String], id: i64) -> Result<Target<Untyped>, ApiError> {
    let id = order_id(id)?;
    Target::put(format!("/orders/{id}/tags")).with_json(&TagUpdate {
        tags: tags.to_vec(),
    })
}

pub fn add_shipment(shipment: &OrderShipment) -> Result<Target<Void>, ApiError> {
    let id = order_id(shipment.order_id)?;
    required("shipping id", &shipment.shipping_id)?;
    Target::post(format!("/orders/{id}/shipment")).with_json(shipment)
}

pub fn create_delivery_note(id: i64, include_pdf: bool) -> Result<Target<Record<DeliveryNote>>, ApiError> {
    let id = order_id(id)?;
    let mut params = CallParams::new();
    params.push_bool("includePdf", include_pdf);
    Ok(Target::post(format!("/orders/CreateDeliveryNote/{id}")).with_params(params))
}

pub fn create_invoice(id: i64, include_pdf: bool) -> Result<Target<Record<Invoice>>, ApiError> {
    let id = order_id(id)?;
    let mut params = CallParams::new();
    params.push_bool("includeInvoicePdf", include_pdf);
    Ok(Target::post(format!("/orders/CreateInvoice/{id}")).with_params(params))
}

/// Order operations bound to a client. Obtained from [`BillbeeClient::orders`].
#[derive(Debug)]
pub struct OrderEndpoint<'a, X> {
    client: &'a BillbeeClient<X>,
}

impl<'a, X: Transport> OrderEndpoint<'a, X> {
    pub(crate) fn new(client: &'a BillbeeClient<X>) -> Self {
        Self { client }
    }

    pub fn get_order(&self, id: &str) -> Result<Envelope<Order>, ApiError> {
        self.client.call(get_order(id)?)
    }

    pub fn get_order_by_external_reference(&self, id: &str) -> Result<Envelope<Order>, ApiError> {
        self.client.call(get_order_by_external_reference(id)?)
    }

    pub fn get_order_by_external_reference_and_partner(
        &self,
        partner: &str,
        id: &str,
    ) -> Result<Envelope<Order>, ApiError> {
        self.client
            .call(get_order_by_external_reference_and_partner(partner, id)?)
    }

    pub fn get_order_list(&self, filter: &OrderListFilter) -> Result<Envelope<Vec<Order>>, ApiError> {
        self.client.call(get_order_list(filter)?)
    }

    pub fn get_invoice_list(
        &self,
        filter: &InvoiceListFilter,
    ) -> Result<Envelope<Vec<InvoiceDetail>>, ApiError> {
        self.client.call(get_invoice_list(filter)?)
    }

    /// Not idempotent: on a transport error the order may or may not exist.
    pub fn post_new_order(&self, order: &Order, shop_id: Option<i64>) -> Result<Envelope<OrderResult>, ApiError> {
        self.client.call(post_new_order(order, shop_id)?)
    }

    pub fn add_tags(&self, tags: &[String], id: i64) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.client.call(add_tags(tags, id)?)
    }

    pub fn update_tags(&self, tags: &[String], id: i64) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.client.call(update_tags(tags, id)?)
    }

    pub fn add_shipment(&self, shipment: &OrderShipment) -> Result<Envelope<()>, ApiError> {
        self.client.call(add_shipment(shipment)?)
    }

    pub fn create_delivery_note(&self, id: i64, include_pdf: bool) -> Result<Envelope<DeliveryNote>, ApiError> {
        self.client.call(create_delivery_note(id, include_pdf)?)
    }

    pub fn create_invoice(&self, id: i64, include_pdf: bool) -> Result<Envelope<Invoice>, ApiError> {
        self.client.call(create_invoice(id, include_pdf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lookup_paths() {
        assert_eq!(get_order("42").unwrap().path, "/orders/42");
        assert_eq!(
            get_order_by_external_reference("EXT-1").unwrap().path,
            "/orders/findbyextref/EXT-1"
        );
        let target = get_order_by_external_reference_and_partner("amazon", "EXT-1").unwrap();
        assert_eq!(target.method, HttpMethod::Get);
        assert_eq!(target.path, "/orders/find/EXT-1/amazon");
        assert!(target.params.is_none());
    }

    #[test]
    fn identifiers_are_percent_encoded() {
        assert_eq!(
            get_order_by_external_reference("AB 12").unwrap().path,
            "/orders/findbyextref/AB%2012"
        );
        assert_eq!(get_order("50%").unwrap().path, "/orders/50%25");
        assert_eq!(
            get_order_by_external_reference_and_partner("shop?a=1", "#7-ü").unwrap().path,
            "/orders/find/%237-%C3%BC/shop%3Fa%3D1"
        );
        assert_eq!(
            get_order_by_external_reference("A-1_b.c~d").unwrap().path,
            "/orders/findbyextref/A-1_b.c~d"
        );
    }

    #[test]
    fn malformed_identifiers_fail_fast() {
        assert!(matches!(get_order(""), Err(ApiError::InvalidArgument(_))));
        assert!(matches!(get_order("1/tags"), Err(ApiError::InvalidArgument(_))));
        assert!(matches!(get_order(".."), Err(ApiError::InvalidArgument(_))));
        assert!(matches!(
            get_order_by_external_reference_and_partner(" ", "EXT-1"),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(update_tags(&tags(&["a"]), 0), Err(ApiError::InvalidArgument(_))));
        assert!(matches!(create_invoice(-3, false), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn post_new_order_without_shop() {
        let order = Order {
            order_number: Some("A-1".to_string()),
            ..Order::default()
        };
        let target = post_new_order(&order, None).unwrap();
        assert_eq!(target.method, HttpMethod::Post);
        assert_eq!(target.path, "/orders");
        assert!(target.params.is_none());
        let body: serde_json::Value = serde_json::from_str(target.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["OrderNumber"], "A-1");
    }

    #[test]
    fn post_new_order_with_shop() {
        let target = post_new_order(&Order::default(), Some(7)).unwrap();
        assert_eq!(target.params.unwrap().get("shopId"), Some("7"));
    }

    #[test]
    fn tag_calls_differ_only_in_verb() {
        let put = update_tags(&tags(&["a", "b"]), 42).unwrap();
        assert_eq!(put.method, HttpMethod::Put);
        assert_eq!(put.path, "/orders/42/tags");
        assert!(put.params.is_none());
        let body: serde_json::Value = serde_json::from_str(put.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"Tags": ["a", "b"]}));

        let post = add_tags(&tags(&["a", "b"]), 42).unwrap();
        assert_eq!(post.method, HttpMethod::Post);
        assert_eq!(post.body, put.body);
    }

    #[test]
    fn shipment_path_uses_its_order_id() {
        let shipment = OrderShipment {
            shipping_id: "TRACK-1".to_string(),
            order_id: 99,
            ..OrderShipment::default()
        };
        let target = add_shipment(&shipment).unwrap();
        assert_eq!(target.method, HttpMethod::Post);
        assert_eq!(target.path, "/orders/99/shipment");

        let unassigned = OrderShipment::default();
        assert!(add_shipment(&unassigned).is_err());
    }

    #[test]
    fn document_calls_always_send_pdf_flag() {
        let note = create_delivery_note(5, false).unwrap();
        assert_eq!(note.method, HttpMethod::Post);
        assert_eq!(note.path, "/orders/CreateDeliveryNote/5");
        assert_eq!(note.params.unwrap().get("includePdf"), Some("False"));

        let invoice = create_invoice(5, true).unwrap();
        assert_eq!(invoice.path, "/orders/CreateInvoice/5");
        assert_eq!(invoice.params.unwrap().get("includeInvoicePdf"), Some("True"));
    }

    #[test]
    fn list_targets_carry_paging() {
        let orders = get_order_list(&OrderListFilter::default()).unwrap();
        assert_eq!(orders.path, "/orders");
        assert_eq!(orders.params.as_ref().unwrap().get("pageSize"), Some("50"));

        let invoices = get_invoice_list(&InvoiceListFilter::default()).unwrap();
        assert_eq!(invoices.path, "/orders/invoices");
        assert_eq!(invoices.params.unwrap().get("includePositions"), Some("False"));
    }
}
