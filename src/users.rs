use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row, ToSql};
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::RosterError;
use crate::utils::Utils;

#[derive(
    AsRefStr, EnumIter, EnumString, Debug, Display, PartialEq, Eq, Copy, Clone, Default, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum UserState {
    #[default]
    Active,
    Inactive,
}

impl ToSql for UserState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_ref()))
    }
}

impl FromSql for UserState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub state: UserState,
    pub created_at: String,
}

impl User {
    /// Columns in the order `from_row` expects them
    pub const SELECT_LIST: &str = "users.id, users.first_name, users.last_name, users.email, \
                                   users.role, users.state, users.created_at";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            role: row.get(4)?,
            state: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

/// Values for inserting a user. Used by seeding and tests; the listing itself never writes.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub state: UserState,
    pub created_at: NaiveDateTime,
}

impl NewUser {
    pub fn new(first_name: &str, last_name: &str, email: &str, created_at: NaiveDateTime) -> Self {
        NewUser {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email: email.to_owned(),
            role: "user".to_owned(),
            state: UserState::Active,
            created_at,
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = role.to_owned();
        self
    }

    pub fn with_state(mut self, state: UserState) -> Self {
        self.state = state;
        self
    }

    pub fn insert(&self, conn: &Connection) -> Result<i64, RosterError> {
        conn.execute(
            "INSERT INTO users (first_name, last_name, email, role, state, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                self.first_name,
                self.last_name,
                self.email,
                self.role,
                self.state,
                Utils::format_db_datetime(&self.created_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

/// A user as shown in a listing page: the record plus its skill names
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserRow {
    #[serde(flatten)]
    pub user: User,
    pub skills: Vec<String>,
}
