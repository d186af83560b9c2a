use std::fmt::Debug;

use chrono::NaiveDateTime;
use rusqlite::ToSql;

use crate::users::UserState;
use crate::utils::Utils;

use super::state::FilterState;

/// Defines the behavior of a filter.
pub trait Filter: Debug {
    /// return predicate text and params
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>);
}

/// Exact match on a text column
#[derive(Debug, Clone)]
pub struct EqualsFilter {
    col_db: &'static str,
    value: String,
}

impl EqualsFilter {
    pub fn new(col_db: &'static str, value: impl Into<String>) -> Self {
        EqualsFilter {
            col_db,
            value: value.into(),
        }
    }

    pub fn state(state: UserState) -> Self {
        Self::new("users.state", state.as_ref())
    }

    pub fn role(role: &str) -> Self {
        Self::new("users.role", role)
    }
}

impl Filter for EqualsFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let pred_vec: Vec<Box<dyn ToSql>> = vec![Box::new(self.value.clone())];
        (format!("({} = ?)", self.col_db), pred_vec)
    }
}

/// Keeps users associated with every one of `skill_ids`.
///
/// Matching associations are grouped per user and counted; only users whose
/// count equals the number of requested skills qualify. A plain
/// `skill_id IN (...)` join would keep users having any one of them.
#[derive(Debug, Clone)]
pub struct SkillsFilter {
    skill_ids: Vec<i64>,
}

impl SkillsFilter {
    /// Returns `None` for an empty set, which constrains nothing
    pub fn new<I: IntoIterator<Item = i64>>(skill_ids: I) -> Option<Self> {
        let mut skill_ids: Vec<i64> = skill_ids.into_iter().collect();
        skill_ids.sort_unstable();
        skill_ids.dedup();

        (!skill_ids.is_empty()).then_some(SkillsFilter { skill_ids })
    }
}

impl Filter for SkillsFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let placeholders = vec!["?"; self.skill_ids.len()].join(", ");
        let pred_str = format!(
            "(users.id IN (SELECT user_skill.user_id FROM user_skill \
             WHERE user_skill.skill_id IN ({placeholders}) \
             GROUP BY user_skill.user_id \
             HAVING COUNT(DISTINCT user_skill.skill_id) = ?))"
        );

        let mut pred_vec: Vec<Box<dyn ToSql>> = self
            .skill_ids
            .iter()
            .map(|id| Box::new(*id) as Box<dyn ToSql>)
            .collect();
        pred_vec.push(Box::new(self.skill_ids.len() as i64));

        (pred_str, pred_vec)
    }
}

/// Inclusive bounds on a date column. Either bound may be open.
#[derive(Debug, Clone)]
pub struct DateFilter {
    date_col_db: &'static str,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
}

impl DateFilter {
    pub fn created_at(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Option<Self> {
        if from.is_none() && to.is_none() {
            return None;
        }
        Some(DateFilter {
            date_col_db: "users.created_at",
            from,
            to,
        })
    }
}

impl Filter for DateFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut preds: Vec<String> = Vec::new();
        let mut pred_vec: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(from) = &self.from {
            preds.push(format!("{} >= ?", self.date_col_db));
            pred_vec.push(Box::new(Utils::format_db_datetime(from)));
        }

        if let Some(to) = &self.to {
            preds.push(format!("{} <= ?", self.date_col_db));
            pred_vec.push(Box::new(Utils::format_db_datetime(to)));
        }

        (format!("({})", preds.join(" AND ")), pred_vec)
    }
}

/// A conjunction of filters. Empty means "all records".
#[derive(Debug, Default)]
pub struct Predicate {
    filters: Vec<Box<dyn Filter>>,
}

impl Predicate {
    pub fn and(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// `\nWHERE ...` (or nothing) and the parameters to bind, in placeholder order
    pub fn to_where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut where_clause = String::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        let mut first = true;
        for filter in &self.filters {
            match first {
                true => {
                    where_clause.push_str("\nWHERE ");
                    first = false;
                }
                false => where_clause.push_str(" AND "),
            }

            let (pred_str, pred_vec) = filter.to_predicate_parts();
            where_clause.push_str(&pred_str);
            params_vec.extend(pred_vec);
        }

        (where_clause, params_vec)
    }
}

pub struct FilterBuilder;

impl FilterBuilder {
    /// Translates the present fields of `filter_state` into a predicate
    pub fn build(filter_state: &FilterState) -> Predicate {
        let mut predicate = Predicate::default();

        if let Some(state) = filter_state.state {
            predicate = predicate.and(EqualsFilter::state(state));
        }

        if let Some(role) = &filter_state.role {
            predicate = predicate.and(EqualsFilter::role(role));
        }

        if let Some(skills_filter) = SkillsFilter::new(filter_state.skill_ids.iter().copied()) {
            predicate = predicate.and(skills_filter);
        }

        if let Some(date_filter) = DateFilter::created_at(filter_state.from, filter_state.to) {
            predicate = predicate.and(date_filter);
        }

        predicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::skills::Skill;
    use crate::users::NewUser;
    use pretty_assertions::assert_eq;
    use rusqlite::Connection;
    use std::collections::BTreeSet;

    fn insert_user(conn: &Connection, email: &str, created_at: &str) -> i64 {
        NewUser::new("Test", "User", email, Utils::parse_db_datetime(created_at).unwrap())
            .insert(conn)
            .unwrap()
    }

    /// Ids of users matched by the predicate, ascending
    fn matching_ids(conn: &Connection, predicate: &Predicate) -> Vec<i64> {
        let (where_clause, params_vec) = predicate.to_where_clause();
        let sql = format!("SELECT users.id FROM users{where_clause}\nORDER BY users.id");
        let sql_params: Vec<&dyn ToSql> = params_vec.iter().map(|b| &**b).collect();
        let mut stmt = conn.prepare(&sql).unwrap();
        let rows = stmt
            .query_map(&sql_params[..], |row| row.get::<_, i64>(0))
            .unwrap();
        rows.map(|r| r.unwrap()).collect()
    }

    fn skills_state(ids: &[i64]) -> FilterState {
        FilterState {
            skill_ids: ids.iter().copied().collect::<BTreeSet<_>>(),
            ..FilterState::default()
        }
    }

    #[test]
    fn test_empty_state_builds_empty_predicate() {
        let predicate = FilterBuilder::build(&FilterState::default());
        let (where_clause, params_vec) = predicate.to_where_clause();
        assert_eq!(where_clause, "");
        assert!(params_vec.is_empty());
    }

    #[test]
    fn test_predicate_text_is_conjunctive() {
        let filter_state = FilterState {
            state: Some(UserState::Active),
            role: Some("admin".into()),
            ..FilterState::default()
        };
        let predicate = FilterBuilder::build(&filter_state);

        let (where_clause, params_vec) = predicate.to_where_clause();
        assert_eq!(
            where_clause,
            "\nWHERE (users.state = ?) AND (users.role = ?)"
        );
        assert_eq!(params_vec.len(), 2);
    }

    #[test]
    fn test_skills_filter_binds_ids_then_count() {
        let filter = SkillsFilter::new([5, 2, 5]).unwrap();
        let (pred_str, pred_vec) = filter.to_predicate_parts();
        assert!(pred_str.contains("IN (?, ?)"));
        assert!(pred_str.contains("HAVING COUNT(DISTINCT user_skill.skill_id) = ?"));
        assert_eq!(pred_vec.len(), 3);
        assert!(SkillsFilter::new(Vec::new()).is_none());
    }

    #[test]
    fn test_state_filter_is_equality_only() {
        let conn = Database::open_in_memory();
        let active = insert_user(&conn, "active@example.com", "2018-10-01 12:00:00");
        let inactive = NewUser::new(
            "Test",
            "User",
            "inactive@example.com",
            Utils::parse_db_datetime("2018-10-01 12:00:00").unwrap(),
        )
        .with_state(UserState::Inactive)
        .with_role("admin")
        .insert(&conn)
        .unwrap();

        let active_only = FilterBuilder::build(&FilterState {
            state: Some(UserState::Active),
            ..FilterState::default()
        });
        assert_eq!(matching_ids(&conn, &active_only), vec![active]);

        let inactive_only = FilterBuilder::build(&FilterState {
            state: Some(UserState::Inactive),
            ..FilterState::default()
        });
        assert_eq!(matching_ids(&conn, &inactive_only), vec![inactive]);
    }

    #[test]
    fn test_role_filter() {
        let conn = Database::open_in_memory();
        let created_at = Utils::parse_db_datetime("2018-10-01 12:00:00").unwrap();
        let admin = NewUser::new("A", "Admin", "admin@example.com", created_at)
            .with_role("admin")
            .insert(&conn)
            .unwrap();
        let user = NewUser::new("U", "User", "user@example.com", created_at)
            .insert(&conn)
            .unwrap();

        let admins = FilterBuilder::build(&FilterState {
            role: Some("admin".into()),
            ..FilterState::default()
        });
        assert_eq!(matching_ids(&conn, &admins), vec![admin]);

        let users = FilterBuilder::build(&FilterState {
            role: Some("user".into()),
            ..FilterState::default()
        });
        assert_eq!(matching_ids(&conn, &users), vec![user]);
    }

    #[test]
    fn test_skills_filter_is_intersection() {
        let conn = Database::open_in_memory();
        let php = Skill::get_or_create(&conn, "php").unwrap();
        let css = Skill::get_or_create(&conn, "css").unwrap();
        let js = Skill::get_or_create(&conn, "js").unwrap();

        let backend_dev = insert_user(&conn, "backend@example.com", "2018-10-01 12:00:00");
        Skill::attach(&conn, backend_dev, &[php.id]).unwrap();

        let full_stack_dev = insert_user(&conn, "full@example.com", "2018-10-01 12:00:00");
        Skill::attach(&conn, full_stack_dev, &[php.id, css.id]).unwrap();

        let frontend_dev = insert_user(&conn, "frontend@example.com", "2018-10-01 12:00:00");
        Skill::attach(&conn, frontend_dev, &[css.id]).unwrap();

        let polyglot = insert_user(&conn, "poly@example.com", "2018-10-01 12:00:00");
        Skill::attach(&conn, polyglot, &[php.id, css.id, js.id]).unwrap();

        let predicate = FilterBuilder::build(&skills_state(&[php.id, css.id]));
        assert_eq!(
            matching_ids(&conn, &predicate),
            vec![full_stack_dev, polyglot]
        );

        let predicate = FilterBuilder::build(&skills_state(&[php.id]));
        assert_eq!(
            matching_ids(&conn, &predicate),
            vec![backend_dev, full_stack_dev, polyglot]
        );
    }

    #[test]
    fn test_unknown_skill_matches_nobody() {
        let conn = Database::open_in_memory();
        let php = Skill::get_or_create(&conn, "php").unwrap();
        let dev = insert_user(&conn, "dev@example.com", "2018-10-01 12:00:00");
        Skill::attach(&conn, dev, &[php.id]).unwrap();

        let predicate = FilterBuilder::build(&skills_state(&[php.id, 999]));
        assert!(matching_ids(&conn, &predicate).is_empty());
    }

    fn date_fixture(conn: &Connection) -> (i64, i64, i64, i64) {
        let newest = insert_user(conn, "newest@example.com", "2018-10-02 12:00:00");
        let oldest = insert_user(conn, "oldest@example.com", "2018-09-29 12:00:00");
        let new_user = insert_user(conn, "new@example.com", "2018-10-01 00:00:00");
        let old_user = insert_user(conn, "old@example.com", "2018-09-30 23:59:59");
        (newest, oldest, new_user, old_user)
    }

    fn date_state(from: Option<&str>, to: Option<&str>) -> FilterState {
        FilterState {
            from: from
                .and_then(Utils::parse_query_date)
                .map(Utils::start_of_day),
            to: to.and_then(Utils::parse_query_date).map(Utils::end_of_day),
            ..FilterState::default()
        }
    }

    #[test]
    fn test_from_date_is_inclusive() {
        let conn = Database::open_in_memory();
        let (newest, _oldest, new_user, _old_user) = date_fixture(&conn);

        let predicate = FilterBuilder::build(&date_state(Some("01/10/2018"), None));
        assert_eq!(matching_ids(&conn, &predicate), vec![newest, new_user]);
    }

    #[test]
    fn test_to_date_is_inclusive() {
        let conn = Database::open_in_memory();
        let (_newest, oldest, _new_user, old_user) = date_fixture(&conn);

        let predicate = FilterBuilder::build(&date_state(None, Some("30/09/2018")));
        assert_eq!(matching_ids(&conn, &predicate), vec![oldest, old_user]);
    }

    #[test]
    fn test_date_range_composes() {
        let conn = Database::open_in_memory();
        let (_newest, _oldest, new_user, old_user) = date_fixture(&conn);

        let predicate =
            FilterBuilder::build(&date_state(Some("30/09/2018"), Some("01/10/2018")));
        assert_eq!(matching_ids(&conn, &predicate), vec![new_user, old_user]);
    }

    #[test]
    fn test_inverted_range_is_empty_not_an_error() {
        let conn = Database::open_in_memory();
        date_fixture(&conn);

        let predicate =
            FilterBuilder::build(&date_state(Some("02/10/2018"), Some("29/09/2018")));
        assert!(matching_ids(&conn, &predicate).is_empty());
    }
}
