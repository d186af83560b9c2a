//! Sort-link state for a listing page.
//!
//! A `Sortable` is rebuilt from each request's query pairs. It knows the
//! current sort column and direction and produces, per column, the CSS classes
//! describing that state and the URL that toggles it. Every other query
//! parameter except `page` is carried over into the generated links, so
//! changing the sort keeps the active filters and starts again at page 1.

use serde::Serialize;
use url::form_urlencoded;

use crate::query::{Direction, SortState, ORDER_PARAM, PAGE_PARAM};

pub const SORTABLE_CLASS: &str = "link-sortable";
pub const SORTED_UP_CLASS: &str = "link-sorted-up";
pub const SORTED_DOWN_CLASS: &str = "link-sorted-down";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortLink {
    pub column: String,
    pub classes: String,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct Sortable {
    base_url: String,
    sort: SortState,
    extra_params: Vec<(String, String)>,
}

impl Sortable {
    pub fn new(base_url: impl Into<String>) -> Self {
        Sortable {
            base_url: base_url.into(),
            sort: SortState::default(),
            extra_params: Vec::new(),
        }
    }

    /// Records query pairs. `order` sets the current sort, `page` is dropped and
    /// everything else is preserved in arrival order.
    pub fn appends<I, K, V>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            let key: String = key.into();
            let value: String = value.into();

            match key.as_str() {
                ORDER_PARAM => self.sort = SortState::from_order_param(&value),
                PAGE_PARAM => {}
                _ => self.extra_params.push((key, value)),
            }
        }
        self
    }

    pub fn classes(&self, column: &str) -> String {
        if !self.sort.is_sorted_by(column) {
            return SORTABLE_CLASS.to_owned();
        }

        let sorted_class = match self.sort.direction {
            Direction::Asc => SORTED_UP_CLASS,
            Direction::Desc => SORTED_DOWN_CLASS,
        };
        format!("{SORTABLE_CLASS} {sorted_class}")
    }

    /// Link that sorts by `column`: ascending for a new column, the opposite
    /// direction for the current one. `None` for a column that can't be
    /// written as an `order` value.
    pub fn url(&self, column: &str) -> Option<String> {
        if !SortState::is_orderable(column) {
            return None;
        }
        let next = self.sort.toggled(column);

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.extra_params {
            serializer.append_pair(key, value);
        }
        if let Some(order) = next.to_order_param() {
            serializer.append_pair(ORDER_PARAM, &order);
        }

        Some(format!("{}?{}", self.base_url, serializer.finish()))
    }

    pub fn link(&self, column: &str) -> Option<SortLink> {
        Some(SortLink {
            column: column.to_owned(),
            classes: self.classes(column),
            url: self.url(column)?,
        })
    }

    pub fn links<'a, I>(&self, columns: I) -> Vec<SortLink>
    where
        I: IntoIterator<Item = &'a str>,
    {
        columns
            .into_iter()
            .filter_map(|column| self.link(column))
            .collect()
    }
}
