//! Blocking client for the Billbee order API.
//!
//! # Overview
//! Every endpoint call follows the same path: a typed filter or argument set
//! is turned into [`CallParams`], an endpoint constructor describes the call
//! as a [`Target`], [`BillbeeClient`] prepares and sends it through a
//! [`Transport`], and the reply is decoded into an [`Envelope`].
//!
//! # Design
//! - Configuration is an immutable [`ApiConfig`] shared by all calls.
//! - Request preparation is pure; the transport is the only I/O seam.
//! - Transport and protocol failures are `Err`; business rejections are data
//!   inside the envelope, checked through [`Envelope::status`].
//! - Nothing is retried.
//!
//! ```rust,no_run
//! use billbee_core::{ApiConfig, BillbeeClient, OrderListFilter};
//!
//! # fn main() -> Result<(), billbee_core::ApiError> {
//! let client = BillbeeClient::new(ApiConfig::from_env()?);
//! let page = client
//!     .orders()
//!     .get_order_list(&OrderListFilter::default().with_shop_ids([5, 9]))?;
//! for order in page.into_data()?.unwrap_or_default() {
//!     println!("{:?}", order.order_number);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod filters;
pub mod http;
pub mod models;
pub mod orders;
pub mod params;
pub mod target;

pub use client::BillbeeClient;
pub use config::ApiConfig;
pub use envelope::{Envelope, EnvelopeFormat, EnvelopeStatus, List, PageInfo, Record, Untyped, Void};
pub use error::{ApiError, BusinessError};
pub use filters::{InvoiceListFilter, OrderListFilter, Paging};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use models::{
    ArticleCategory, DeliveryNote, Invoice, InvoiceDetail, Order, OrderResult, OrderShipment, TagUpdate,
};
pub use orders::OrderEndpoint;
pub use params::CallParams;
pub use target::Target;
