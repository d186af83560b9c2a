use log::{debug, Level};
use logging_timer::timer;
use rusqlite::{Connection, ToSql};
use serde::Serialize;

use crate::error::RosterError;
use crate::query::{ColSet, FilterBuilder, FilterState, Order, SortState};
use crate::skills::Skill;
use crate::users::{User, UserRow};

/// One page of a listing. `page_number` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: i64,
}

impl<T> Page<T> {
    /// Number of the last page; 1 for an empty listing
    pub fn last_page(&self) -> u32 {
        let page_size = i64::from(self.page_size.max(1));
        let pages = (self.total_count + page_size - 1) / page_size;
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    pub fn has_more_pages(&self) -> bool {
        self.page_number < self.last_page()
    }
}

/// Runs filtered, sorted, paginated user listings against the record store.
/// Filtering, ordering and slicing all happen in SQL.
#[derive(Clone, Copy, Debug)]
pub struct ListingService {
    page_size: u32,
}

impl ListingService {
    const USERS_SQL_QUERY: &str = "SELECT {select_list}
        FROM users{where_clause}{order_clause}
        LIMIT ? OFFSET ?";

    const USERS_SQL_COUNT: &str = "SELECT COUNT(*) FROM users{where_clause}";

    pub fn new(page_size: u32) -> Self {
        ListingService {
            page_size: page_size.max(1),
        }
    }

    pub fn list(
        &self,
        conn: &Connection,
        filter: &FilterState,
        sort: &SortState,
        page_number: u32,
    ) -> Result<Page<UserRow>, RosterError> {
        let _tmr = timer!(Level::Trace; "ListingService::list", "page {}", page_number);

        let page_number = page_number.max(1);
        let predicate = FilterBuilder::build(filter);
        let order = Order::from_sort_state(sort, ColSet::users());
        let (where_clause, params_vec) = predicate.to_where_clause();

        // Count with the same predicate, no ordering
        let count_sql = Self::USERS_SQL_COUNT.replace("{where_clause}", &where_clause);
        debug!("Count query: {}", count_sql);
        let sql_params: Vec<&dyn ToSql> = params_vec.iter().map(|b| &**b).collect();
        let total_count: i64 = conn.query_row(&count_sql, &sql_params[..], |row| row.get(0))?;

        let page_sql = Self::USERS_SQL_QUERY
            .replace("{select_list}", User::SELECT_LIST)
            .replace("{where_clause}", &where_clause)
            .replace("{order_clause}", &order.to_order_clause());
        debug!("Page query: {}", page_sql);

        let limit = i64::from(self.page_size);
        // Saturates for huge pages; SQLite then returns no rows
        let offset = i64::from(page_number - 1).saturating_mul(limit);
        let mut page_params = sql_params;
        page_params.push(&limit);
        page_params.push(&offset);

        let mut stmt = conn.prepare(&page_sql)?;
        let users = stmt
            .query_map(&page_params[..], User::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let user_ids: Vec<i64> = users.iter().map(|user| user.id).collect();
        let mut skill_names = Skill::names_for_users(conn, &user_ids)?;

        let items = users
            .into_iter()
            .map(|user| {
                let skills = skill_names.remove(&user.id).unwrap_or_default();
                UserRow { user, skills }
            })
            .collect();

        Ok(Page {
            items,
            page_number,
            page_size: self.page_size,
            total_count,
        })
    }
}
