//! List screen tables: columns, sort links, paging links and page sizes.

use serde::Deserialize;

use crate::api::{
    DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS, PageQuery, PagedResponse, Resource, order_by,
};

/// Column definition for a data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Sort key sent as `orderBy`; empty for display-only columns.
    pub key: &'static str,
    /// Display label for the column header.
    pub label: &'static str,
    pub sortable: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub const fn sortable(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub const fn new(label: &'static str) -> Self {
        Self {
            key: "",
            label,
            sortable: false,
        }
    }
}

/// `?pageNumber=&pageSize=&orderBy=&search=` on list screens.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub order_by: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    /// Normalize into an API query: page numbers start at 1, sizes come from
    /// the offered options and the sort column from the resource's list.
    #[must_use]
    pub fn to_page_query<R: Resource>(&self) -> PageQuery {
        let page_size = self
            .page_size
            .filter(|size| PAGE_SIZE_OPTIONS.contains(size))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        PageQuery {
            page_number: self.page_number.unwrap_or(1).max(1),
            page_size,
            order_by: Some(order_by::<R>(self.order_by.as_deref()).to_string()),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// A page-size choice in the footer select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSizeOption {
    pub size: u32,
    pub selected: bool,
}

/// Header cell with its resolved sort link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub label: &'static str,
    pub href: Option<String>,
    pub active: bool,
}

/// A configured table bound to one page of results.
#[derive(Debug, Clone)]
pub struct DataTable {
    pub base_path: &'static str,
    pub headers: Vec<HeaderCell>,
    pub search: String,
    pub search_placeholder: &'static str,
    pub empty_title: &'static str,
    pub page_number: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub first_row: u64,
    pub last_row: u64,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub page_sizes: Vec<PageSizeOption>,
    page_size: u32,
    order_by: String,
}

impl DataTable {
    /// Build the table for `page`, fetched with `query`.
    #[must_use]
    pub fn new<T>(
        base_path: &'static str,
        columns: &[TableColumn],
        query: &PageQuery,
        page: &PagedResponse<T>,
    ) -> Self {
        let order_by = query.order_by.clone().unwrap_or_default();
        let page_size = query.page_size;
        let shown = page.items.len() as u64;
        let offset = u64::from(page.page_number.saturating_sub(1)) * u64::from(page_size);

        let mut table = Self {
            base_path,
            headers: Vec::new(),
            search: query.search.clone().unwrap_or_default(),
            search_placeholder: "Search...",
            empty_title: "No records found",
            page_number: page.page_number.max(1),
            total_pages: page.total_pages.max(1),
            total_count: page.total_count,
            first_row: if shown == 0 { 0 } else { offset + 1 },
            last_row: offset + shown,
            previous_href: None,
            next_href: None,
            page_sizes: PAGE_SIZE_OPTIONS
                .iter()
                .map(|&size| PageSizeOption {
                    size,
                    selected: size == page_size,
                })
                .collect(),
            page_size,
            order_by,
        };

        table.headers = columns
            .iter()
            .map(|column| HeaderCell {
                label: column.label,
                href: column
                    .sortable
                    .then(|| table.href(1, table.page_size, column.key)),
                active: column.sortable && column.key == table.order_by,
            })
            .collect();
        let previous = table.page_number.saturating_sub(1).max(1);
        table.previous_href = page
            .has_previous_page
            .then(|| table.href(previous, table.page_size, &table.order_by));
        table.next_href = page
            .has_next_page
            .then(|| table.href(table.page_number + 1, table.page_size, &table.order_by));
        table
    }

    #[must_use]
    pub const fn search_placeholder(mut self, placeholder: &'static str) -> Self {
        self.search_placeholder = placeholder;
        self
    }

    #[must_use]
    pub const fn empty_state(mut self, title: &'static str) -> Self {
        self.empty_title = title;
        self
    }

    /// The sort column in effect, for hidden form fields.
    #[must_use]
    pub fn order_by(&self) -> &str {
        &self.order_by
    }

    fn href(&self, page_number: u32, page_size: u32, order_by: &str) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("pageNumber", &page_number.to_string())
            .append_pair("pageSize", &page_size.to_string());
        if !order_by.is_empty() {
            query.append_pair("orderBy", order_by);
        }
        if !self.search.is_empty() {
            query.append_pair("search", &self.search);
        }
        format!("{}?{}", self.base_path, query.finish())
    }
}

/// Build the employees table columns.
#[must_use]
pub const fn employee_columns() -> [TableColumn; 6] {
    [
        TableColumn::sortable("employeeNumber", "Number"),
        TableColumn::sortable("lastName", "Name"),
        TableColumn::sortable("email", "Email"),
        TableColumn::new("Phone"),
        TableColumn::new("Hire Date"),
        TableColumn::sortable("salary", "Salary"),
    ]
}

#[must_use]
pub const fn department_columns() -> [TableColumn; 2] {
    [TableColumn::sortable("name", "Name"), TableColumn::new("Created")]
}

#[must_use]
pub const fn position_columns() -> [TableColumn; 3] {
    [
        TableColumn::sortable("positionNumber", "Number"),
        TableColumn::sortable("positionTitle", "Title"),
        TableColumn::new("Description"),
    ]
}

#[must_use]
pub const fn salary_range_columns() -> [TableColumn; 3] {
    [
        TableColumn::sortable("name", "Name"),
        TableColumn::sortable("minSalary", "Minimum"),
        TableColumn::sortable("maxSalary", "Maximum"),
    ]
}
