//! Response envelopes and paging shared by every endpoint.

use serde::{Deserialize, Serialize};

/// Page sizes offered by list screens.
pub const PAGE_SIZE_OPTIONS: [u32; 5] = [5, 10, 25, 50, 100];

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A page of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    pub total_count: u64,
    #[serde(default)]
    pub has_previous_page: bool,
    #[serde(default)]
    pub has_next_page: bool,
}

impl<T> PagedResponse<T> {
    /// Build a page, deriving the navigation fields from the totals.
    #[must_use]
    pub fn new(items: Vec<T>, page_number: u32, page_size: u32, total_count: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = u32::try_from(total_count.div_ceil(u64::from(page_size)))
            .unwrap_or(u32::MAX);
        Self {
            items,
            page_number,
            page_size,
            total_pages,
            total_count,
            has_previous_page: page_number > 1,
            has_next_page: page_number < total_pages,
        }
    }
}

/// The backend's generic wrapper: `{ value, isSuccess, message, ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub value: Option<T>,
    #[serde(default = "default_true")]
    pub is_success: bool,
    pub message: Option<String>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub records_total: Option<u64>,
    pub records_filtered: Option<u64>,
}

const fn default_true() -> bool {
    true
}

/// Any of the list shapes the backend returns.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody<T> {
    Bare(Vec<T>),
    Paged(PagedResponse<T>),
    Envelope(ApiEnvelope<Vec<T>>),
}

/// A single record, bare or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordBody<T> {
    Envelope(EnvelopeRequired<T>),
    Bare(T),
}

/// Envelope variant that only matches when `value` is actually present, so
/// a bare record with an unrelated `message` field is not mistaken for one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnvelopeRequired<T> {
    pub value: T,
    #[serde(default = "default_true")]
    pub is_success: bool,
    pub message: Option<String>,
}

/// Query for a paged list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page_number: u32,
    pub page_size: u32,
    pub order_by: Option<String>,
    pub search: Option<String>,
}

impl PageQuery {
    /// Query string pairs; unset values are omitted.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pageNumber", self.page_number.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(order_by) = &self.order_by {
            params.push(("orderBy", order_by.clone()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("searchTerm", search.trim().to_string()));
        }
        params
    }
}

/// Dates travel as `YYYY-MM-DD` or as an ISO timestamp; only the date part
/// is kept.
pub mod wire_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    /// Parse the leading `YYYY-MM-DD` of a date or timestamp string.
    #[must_use]
    pub fn parse(input: &str) -> Option<NaiveDate> {
        let input = input.trim();
        let date = input.get(..10).unwrap_or(input);
        NaiveDate::parse_from_str(date, FORMAT).ok()
    }

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_body_shapes() {
        let bare: ListBody<u32> = serde_json::from_str("[1,2]").unwrap();
        assert!(matches!(bare, ListBody::Bare(v) if v == vec![1, 2]));

        let paged: ListBody<u32> = serde_json::from_str(
            r#"{"items":[3],"pageNumber":1,"pageSize":10,"totalPages":1,"totalCount":1,
                "hasPreviousPage":false,"hasNextPage":false}"#,
        )
        .unwrap();
        assert!(matches!(paged, ListBody::Paged(p) if p.items == vec![3]));

        let envelope: ListBody<u32> = serde_json::from_str(
            r#"{"value":[4,5],"isSuccess":true,"recordsTotal":42,"pageNumber":2,"pageSize":2}"#,
        )
        .unwrap();
        assert!(matches!(envelope, ListBody::Envelope(e) if e.records_total == Some(42)));
    }

    #[test]
    fn test_record_body_prefers_envelope_only_with_value() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Thing {
            name: String,
        }
        let wrapped: RecordBody<Thing> =
            serde_json::from_str(r#"{"value":{"name":"a"},"isSuccess":true}"#).unwrap();
        assert!(matches!(wrapped, RecordBody::Envelope(e) if e.value.name == "a"));

        let bare: RecordBody<Thing> = serde_json::from_str(r#"{"name":"b"}"#).unwrap();
        assert!(matches!(bare, RecordBody::Bare(t) if t.name == "b"));
    }

    #[test]
    fn test_paged_response_new() {
        let page = PagedResponse::new(vec![1, 2], 2, 10, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous_page);
        assert!(page.has_next_page);

        let last = PagedResponse::new(Vec::<u8>::new(), 3, 10, 25);
        assert!(!last.has_next_page);
    }

    #[test]
    fn test_wire_date_accepts_timestamps() {
        let date = wire_date::parse("1985-04-12T00:00:00").unwrap();
        assert_eq!(date.to_string(), "1985-04-12");
        assert!(wire_date::parse("12/04/1985").is_none());
    }

    #[test]
    fn test_page_query_params_skip_unset() {
        let query = PageQuery {
            page_number: 1,
            page_size: 10,
            order_by: None,
            search: Some("  ".into()),
        };
        assert_eq!(
            query.to_params(),
            vec![("pageNumber", "1".to_string()), ("pageSize", "10".to_string())]
        );
    }
}
