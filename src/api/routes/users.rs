use axum::{extract::RawQuery, http::StatusCode, Json};
use log::error;
use rusqlite::Connection;
use serde::Serialize;

use crate::config::Config;
use crate::database::Database;
use crate::error::RosterError;
use crate::listing::{ListingService, Page};
use crate::query::{query_pairs, ColSet, FilterState, QueryState, SortState};
use crate::sortable::{SortLink, Sortable};
use crate::users::UserRow;

pub const USERS_PATH: &str = "/api/users";

/// Response for the users listing: the page, one sort link per sortable
/// column, and the filters as they were understood
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Page<UserRow>,
    pub last_page: u32,
    pub has_more_pages: bool,
    pub sort: SortState,
    pub sort_links: Vec<SortLink>,
    pub filters: FilterState,
}

/// Builds the listing response for a request's raw query string
pub fn build_users_response(
    conn: &Connection,
    raw_query: Option<&str>,
    page_size: u32,
) -> Result<UsersResponse, RosterError> {
    let pairs = query_pairs(raw_query);
    let query_state = QueryState::parse(&pairs);

    let mut sortable = Sortable::new(USERS_PATH);
    sortable.appends(pairs);

    let page = ListingService::new(page_size).list(
        conn,
        &query_state.filter,
        &query_state.sort,
        query_state.page,
    )?;

    Ok(UsersResponse {
        last_page: page.last_page(),
        has_more_pages: page.has_more_pages(),
        users: page,
        sort_links: sortable.links(ColSet::users().names().copied()),
        sort: query_state.sort,
        filters: query_state.filter,
    })
}

/// GET /api/users?order=&state=&role=&skills[]=&from=&to=&page=
pub async fn list_users(RawQuery(raw_query): RawQuery) -> Result<Json<UsersResponse>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        error!("Failed to get database connection: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match build_users_response(&conn, raw_query.as_deref(), Config::get_page_size()) {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Failed to list users for query {:?}: {}", raw_query, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::Skill;
    use crate::users::{NewUser, UserState};
    use crate::utils::Utils;
    use pretty_assertions::assert_eq;

    fn fixture() -> Connection {
        let conn = Database::open_in_memory();
        let created_at = Utils::parse_db_datetime("2018-10-01 12:00:00").unwrap();
        let php = Skill::get_or_create(&conn, "php").unwrap();

        let ada = NewUser::new("Ada", "Lovelace", "ada@example.com", created_at)
            .insert(&conn)
            .unwrap();
        Skill::attach(&conn, ada, &[php.id]).unwrap();

        NewUser::new("Alan", "Turing", "alan@example.com", created_at)
            .with_state(UserState::Inactive)
            .insert(&conn)
            .unwrap();
        conn
    }

    #[test]
    fn test_response_without_query() {
        let conn = fixture();
        let response = build_users_response(&conn, None, 15).unwrap();

        assert_eq!(response.users.total_count, 2);
        assert_eq!(response.last_page, 1);
        assert!(!response.has_more_pages);
        assert_eq!(response.sort, SortState::default());
        assert_eq!(response.sort_links.len(), 6);
        assert_eq!(response.sort_links[0].url, "/api/users?order=first_name");
        assert!(response
            .sort_links
            .iter()
            .all(|link| link.classes == "link-sortable"));
    }

    #[test]
    fn test_response_with_filters_and_sort() {
        let conn = fixture();
        let response =
            build_users_response(&conn, Some("state=active&order=email&page=1"), 15).unwrap();

        assert_eq!(response.users.total_count, 1);
        assert_eq!(response.users.items[0].user.first_name, "Ada");
        assert_eq!(response.users.items[0].skills, vec!["php"]);
        assert_eq!(response.filters.state, Some(UserState::Active));

        let email_link = response
            .sort_links
            .iter()
            .find(|link| link.column == "email")
            .unwrap();
        assert_eq!(email_link.classes, "link-sortable link-sorted-up");
        assert_eq!(email_link.url, "/api/users?state=active&order=email-desc");
    }

    #[test]
    fn test_response_serializes() {
        let conn = fixture();
        let response = build_users_response(&conn, Some("order=first_name-desc"), 1).unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["users"]["page_size"], 1);
        assert_eq!(json["users"]["total_count"], 2);
        assert_eq!(json["users"]["items"][0]["first_name"], "Alan");
        assert_eq!(json["last_page"], 2);
        assert_eq!(json["has_more_pages"], true);
        assert_eq!(json["sort"]["direction"], "desc");
    }
}
