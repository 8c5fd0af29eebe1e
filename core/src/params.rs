//! Query parameter building.
//!
//! `CallParams` is an ordered, multi-valued list of `(name, value)` pairs. It
//! is built fresh for every call and consumed when the request is prepared.
//! Encoding rules the remote API depends on:
//!
//! - absent optional scalars produce no key at all
//! - lists expand to `name[0]`, `name[1]`, ... in iteration order
//! - dates render as `yyyy-MM-dd HH:mm`
//! - booleans render as `True` / `False`

use std::fmt::Display;

use chrono::NaiveDateTime;
use url::form_urlencoded;

use crate::filters::Paging;

/// Date format expected by every date filter of the order API.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallParams {
    pairs: Vec<(String, String)>,
}

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    pub fn push_opt<V: Display>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(name, value.to_string());
        }
        self
    }

    pub fn push_date(&mut self, name: &str, value: Option<NaiveDateTime>) -> &mut Self {
        self.push_opt(name, value.map(|d| d.format(DATE_FORMAT)))
    }

    pub fn push_bool(&mut self, name: &str, value: bool) -> &mut Self {
        self.push(name, format_bool(value))
    }

    pub fn push_list<I>(&mut self, name: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        for (i, value) in values.into_iter().enumerate() {
            self.push(format!("{name}[{i}]"), value.to_string());
        }
        self
    }

    /// `page` and `pageSize` are sent even when they hold the defaults.
    pub fn push_paging(&mut self, paging: Paging) -> &mut Self {
        self.push("page", paging.page.to_string());
        self.push("pageSize", paging.page_size.to_string())
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` query string, without the leading `?`.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.pairs {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

/// Boolean spelling the remote API has always been sent.
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn list_expands_to_indexed_keys_in_order() {
        let mut params = CallParams::new();
        params.push_list("tag", ["b", "a", "c"]);
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("tag[0]", "b"), ("tag[1]", "a"), ("tag[2]", "c")]);
    }

    #[test]
    fn empty_list_adds_nothing() {
        let mut params = CallParams::new();
        params.push_list("shopId", Vec::<i64>::new());
        assert!(params.is_empty());
    }

    #[test]
    fn absent_scalar_adds_nothing() {
        let mut params = CallParams::new();
        params
            .push_opt("minimumBillBeeOrderId", None::<i64>)
            .push_date("minOrderDate", None);
        assert!(params.is_empty());
        assert_eq!(params.get("minimumBillBeeOrderId"), None);
    }

    #[test]
    fn dates_use_fixed_format() {
        let mut params = CallParams::new();
        params.push_date("minOrderDate", Some(date(2023, 1, 1, 0, 0)));
        params.push_date("maxOrderDate", Some(date(2023, 12, 31, 23, 59)));
        assert_eq!(params.get("minOrderDate"), Some("2023-01-01 00:00"));
        assert_eq!(params.get("maxOrderDate"), Some("2023-12-31 23:59"));
    }

    #[test]
    fn booleans_are_pascal_case() {
        let mut params = CallParams::new();
        params.push_bool("includePdf", true).push_bool("includePositions", false);
        assert_eq!(params.get("includePdf"), Some("True"));
        assert_eq!(params.get("includePositions"), Some("False"));
    }

    #[test]
    fn paging_defaults_are_always_sent() {
        let mut params = CallParams::new();
        params.push_paging(Paging::default());
        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("pageSize"), Some("50"));
    }

    #[test]
    fn encode_escapes_brackets_and_spaces() {
        let mut params = CallParams::new();
        params.push_date("minOrderDate", Some(date(2023, 1, 1, 0, 0)));
        params.push_list("shopId", [5]);
        assert_eq!(
            params.encode(),
            "minOrderDate=2023-01-01+00%3A00&shopId%5B0%5D=5"
        );
    }
}
