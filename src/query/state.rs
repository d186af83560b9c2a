//! Typed view of a listing request's query parameters.
//!
//! Parsing never fails: a value that can't be understood is treated as if the
//! parameter was absent.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::users::UserState;
use crate::utils::Utils;

pub const ORDER_PARAM: &str = "order";
pub const PAGE_PARAM: &str = "page";
pub const STATE_PARAM: &str = "state";
pub const ROLE_PARAM: &str = "role";
pub const SKILLS_PARAM: &str = "skills";
pub const FROM_PARAM: &str = "from";
pub const TO_PARAM: &str = "to";

/// Suffix on the `order` value that requests descending order. A column whose
/// name itself ends with it can't be expressed in an `order` value.
pub const DESC_SUFFIX: &str = "-desc";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: Direction,
}

impl SortState {
    pub fn new(column: &str, direction: Direction) -> Self {
        SortState {
            column: Some(column.to_owned()),
            direction,
        }
    }

    /// Splits an `order` value such as `first_name-desc` into column and direction.
    /// The column is not validated here.
    pub fn from_order_param(value: &str) -> Self {
        let value = value.trim();
        let (column, direction) = match value.strip_suffix(DESC_SUFFIX) {
            Some(column) => (column, Direction::Desc),
            None => (value, Direction::Asc),
        };

        if column.is_empty() {
            return SortState::default();
        }

        SortState::new(column, direction)
    }

    /// Value of the `order` parameter that requests this state, if any
    pub fn to_order_param(&self) -> Option<String> {
        let column = self.column.as_deref()?;
        Some(match self.direction {
            Direction::Asc => column.to_owned(),
            Direction::Desc => format!("{column}{DESC_SUFFIX}"),
        })
    }

    /// Whether `column` survives a trip through the `order` parameter
    pub fn is_orderable(column: &str) -> bool {
        !column.is_empty() && !column.ends_with(DESC_SUFFIX)
    }

    pub fn is_sorted_by(&self, column: &str) -> bool {
        self.column.as_deref() == Some(column)
    }

    /// State requested by clicking `column`: the current column flips direction,
    /// any other column starts ascending.
    pub fn toggled(&self, column: &str) -> Self {
        let direction = if self.is_sorted_by(column) {
            self.direction.opposite()
        } else {
            Direction::Asc
        };
        SortState::new(column, direction)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub state: Option<UserState>,
    pub role: Option<String>,
    pub skill_ids: BTreeSet<i64>,
    /// Inclusive lower bound on `created_at` (start of the `from` day)
    pub from: Option<NaiveDateTime>,
    /// Inclusive upper bound on `created_at` (last second of the `to` day)
    pub to: Option<NaiveDateTime>,
}

/// Decodes a raw (still percent-encoded) query string into ordered pairs,
/// keeping repeated keys
pub fn query_pairs(raw_query: Option<&str>) -> Vec<(String, String)> {
    raw_query
        .map(|query| {
            url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryState {
    pub sort: SortState,
    pub filter: FilterState,
    pub page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        QueryState {
            sort: SortState::default(),
            filter: FilterState::default(),
            page: 1,
        }
    }
}

impl QueryState {
    /// Builds the state from decoded query pairs. For scalar parameters the last
    /// occurrence wins; skills accumulate across `skills`, `skills[]` and `skills[N]`.
    pub fn parse<K, V>(raw_params: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query_state = QueryState::default();

        for (key, value) in raw_params {
            let key = key.as_ref();
            let value = value.as_ref();

            match key {
                ORDER_PARAM => query_state.sort = SortState::from_order_param(value),
                PAGE_PARAM => query_state.page = Self::parse_page(value),
                STATE_PARAM => query_state.filter.state = value.trim().parse().ok(),
                ROLE_PARAM => query_state.filter.role = Self::parse_role(value),
                FROM_PARAM => {
                    query_state.filter.from =
                        Utils::parse_query_date(value).map(Utils::start_of_day)
                }
                TO_PARAM => {
                    query_state.filter.to = Utils::parse_query_date(value).map(Utils::end_of_day)
                }
                _ if Self::is_skills_key(key) => {
                    if let Ok(skill_id) = value.trim().parse::<i64>() {
                        query_state.filter.skill_ids.insert(skill_id);
                    }
                }
                _ => {}
            }
        }

        query_state
    }

    fn parse_page(value: &str) -> u32 {
        match value.trim().parse::<u32>() {
            Ok(page) if page >= 1 => page,
            _ => 1,
        }
    }

    fn parse_role(value: &str) -> Option<String> {
        let role = value.trim();
        (!role.is_empty()).then(|| role.to_owned())
    }

    fn is_skills_key(key: &str) -> bool {
        match key.strip_prefix(SKILLS_PARAM) {
            Some("") => true,
            Some(index) => {
                index.len() >= 2
                    && index.starts_with('[')
                    && index.ends_with(']')
                    && index[1..index.len() - 1].chars().all(|c| c.is_ascii_digit())
            }
            None => false,
        }
    }
}
