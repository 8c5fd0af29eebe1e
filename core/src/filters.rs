//! Typed options for the listing calls.
//!
//! Every optional filter is a field with a documented default, so call sites
//! read as `OrderListFilter::default().with_shop_ids([5, 9])` instead of a
//! long positional argument list.

use chrono::NaiveDateTime;

use crate::error::ApiError;
use crate::params::CallParams;

/// Largest page the remote API serves.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Page selection for listing calls. Defaults to page 1 with 50 entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Paging {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.page == 0 {
            return Err(ApiError::invalid("page starts at 1"));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ApiError::invalid(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

/// Filters for `GET /orders`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderListFilter {
    pub min_order_date: Option<NaiveDateTime>,
    pub max_order_date: Option<NaiveDateTime>,
    pub paging: Paging,
    pub shop_ids: Vec<i64>,
    /// See the remote API's order state table.
    pub order_state_ids: Vec<i32>,
    /// Only orders carrying one of these tags.
    pub tags: Vec<String>,
    /// Ids are sequential, so this skips orders that were already imported.
    pub minimum_order_id: Option<i64>,
    pub modified_at_min: Option<NaiveDateTime>,
    pub modified_at_max: Option<NaiveDateTime>,
}

impl OrderListFilter {
    pub fn with_order_dates(
        mut self,
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    ) -> Self {
        self.min_order_date = min;
        self.max_order_date = max;
        self
    }

    pub fn with_paging(mut self, page: u32, page_size: u32) -> Self {
        self.paging = Paging::new(page, page_size);
        self
    }

    pub fn with_shop_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.shop_ids = ids.into_iter().collect();
        self
    }

    pub fn with_order_state_ids(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.order_state_ids = ids.into_iter().collect();
        self
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_minimum_order_id(mut self, id: i64) -> Self {
        self.minimum_order_id = Some(id);
        self
    }

    pub fn with_modified_window(
        mut self,
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    ) -> Self {
        self.modified_at_min = min;
        self.modified_at_max = max;
        self
    }

    pub fn to_params(&self) -> Result<CallParams, ApiError> {
        self.paging.validate()?;
        let mut params = CallParams::new();
        params
            .push_date("minOrderDate", self.min_order_date)
            .push_date("maxOrderDate", self.max_order_date)
            .push_date("modifiedAtMin", self.modified_at_min)
            .push_date("modifiedAtMax", self.modified_at_max)
            .push_opt("minimumBillBeeOrderId", self.minimum_order_id)
            .push_list("shopId", &self.shop_ids)
            .push_list("tag", &self.tags)
            .push_list("orderStateId", &self.order_state_ids)
            .push_paging(self.paging);
        Ok(params)
    }
}

/// Filters for `GET /orders/invoices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceListFilter {
    pub min_invoice_date: Option<NaiveDateTime>,
    pub max_invoice_date: Option<NaiveDateTime>,
    pub paging: Paging,
    pub shop_ids: Vec<i64>,
    pub order_state_ids: Vec<i32>,
    pub tags: Vec<String>,
    pub min_pay_date: Option<NaiveDateTime>,
    pub max_pay_date: Option<NaiveDateTime>,
    /// Include the invoice line items. Always sent, `False` by default.
    pub include_positions: bool,
}

impl InvoiceListFilter {
    pub fn with_invoice_dates(
        mut self,
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    ) -> Self {
        self.min_invoice_date = min;
        self.max_invoice_date = max;
        self
    }

    pub fn with_paging(mut self, page: u32, page_size: u32) -> Self {
        self.paging = Paging::new(page, page_size);
        self
    }

    pub fn with_shop_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.shop_ids = ids.into_iter().collect();
        self
    }

    pub fn with_order_state_ids(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.order_state_ids = ids.into_iter().collect();
        self
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pay_dates(mut self, min: Option<NaiveDateTime>, max: Option<NaiveDateTime>) -> Self {
        self.min_pay_date = min;
        self.max_pay_date = max;
        self
    }

    pub fn with_positions(mut self, include: bool) -> Self {
        self.include_positions = include;
        self
    }

    pub fn to_params(&self) -> Result<CallParams, ApiError> {
        self.paging.validate()?;
        let mut params = CallParams::new();
        params
            .push_date("minInvoiceDate", self.min_invoice_date)
            .push_date("maxInvoiceDate", self.max_invoice_date)
            .push_date("minPayDate", self.min_pay_date)
            .push_date("maxPayDate", self.max_pay_date)
            .push_list("shopId", &self.shop_ids)
            .push_list("tag", &self.tags)
            .push_list("orderStateId", &self.order_state_ids)
            .push_bool("includePositions", self.include_positions)
            .push_paging(self.paging);
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn default_order_filter_only_sends_paging() {
        let params = OrderListFilter::default().to_params().unwrap();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("page", "1"), ("pageSize", "50")]);
    }

    #[test]
    fn order_filter_scenario() {
        let params = OrderListFilter::default()
            .with_order_dates(Some(day(2023, 1, 1)), None)
            .with_shop_ids([5, 9])
            .with_paging(2, 20)
            .to_params()
            .unwrap();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("minOrderDate", "2023-01-01 00:00"),
                ("shopId[0]", "5"),
                ("shopId[1]", "9"),
                ("page", "2"),
                ("pageSize", "20"),
            ]
        );
    }

    #[test]
    fn modified_window_bounds_come_from_their_own_inputs() {
        let params = OrderListFilter::default()
            .with_modified_window(Some(day(2023, 3, 1)), Some(day(2023, 3, 31)))
            .to_params()
            .unwrap();
        assert_eq!(params.get("modifiedAtMin"), Some("2023-03-01 00:00"));
        assert_eq!(params.get("modifiedAtMax"), Some("2023-03-31 00:00"));

        let only_min = OrderListFilter::default()
            .with_modified_window(Some(day(2023, 3, 1)), None)
            .to_params()
            .unwrap();
        assert_eq!(only_min.get("modifiedAtMin"), Some("2023-03-01 00:00"));
        assert_eq!(only_min.get("modifiedAtMax"), None);
    }

    #[test]
    fn order_filter_lists_and_minimum_id() {
        let params = OrderListFilter::default()
            .with_tags(["express", "gift"])
            .with_order_state_ids([1, 3])
            .with_minimum_order_id(1000)
            .to_params()
            .unwrap();
        assert_eq!(params.get("tag[0]"), Some("express"));
        assert_eq!(params.get("tag[1]"), Some("gift"));
        assert_eq!(params.get("orderStateId[0]"), Some("1"));
        assert_eq!(params.get("orderStateId[1]"), Some("3"));
        assert_eq!(params.get("minimumBillBeeOrderId"), Some("1000"));
        assert_eq!(params.get("tag[2]"), None);
    }

    #[test]
    fn invoice_filter_always_sends_include_positions() {
        let params = InvoiceListFilter::default().to_params().unwrap();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(
            pairs,
            vec![("includePositions", "False"), ("page", "1"), ("pageSize", "50")]
        );
    }

    #[test]
    fn invoice_filter_pay_window() {
        let params = InvoiceListFilter::default()
            .with_pay_dates(Some(day(2024, 2, 1)), Some(day(2024, 2, 29)))
            .with_positions(true)
            .to_params()
            .unwrap();
        assert_eq!(params.get("minPayDate"), Some("2024-02-01 00:00"));
        assert_eq!(params.get("maxPayDate"), Some("2024-02-29 00:00"));
        assert_eq!(params.get("includePositions"), Some("True"));
    }

    #[test]
    fn invalid_paging_is_rejected() {
        let zero_page = OrderListFilter::default().with_paging(0, 50).to_params();
        assert!(matches!(zero_page, Err(ApiError::InvalidArgument(_))));

        let too_large = InvoiceListFilter::default().with_paging(1, 251).to_params();
        assert!(matches!(too_large, Err(ApiError::InvalidArgument(_))));
    }
}
