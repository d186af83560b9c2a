use phf::ordered_map::Keys;
use phf_macros::phf_ordered_map;

pub type ColMap = phf::OrderedMap<&'static str, ColSpec>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColType {
    Id,
    Date,
    String,
    Enum,
}

#[derive(Debug)]
pub struct ColSpec {
    pub name_db: &'static str,
    pub col_type: ColType,
}

impl ColSpec {
    const fn new(name_db: &'static str, col_type: ColType) -> Self {
        ColSpec { name_db, col_type }
    }

    /// Text columns sort case-insensitively
    pub fn collation(&self) -> Option<&'static str> {
        match self.col_type {
            ColType::String => Some("NOCASE"),
            _ => None,
        }
    }
}

/// Columns a user listing may be ordered by, keyed by the name used in the `order` parameter.
/// Anything not in this map never reaches SQL.
pub const USERS_SORT_COLS: ColMap = phf_ordered_map! {
    "first_name" => ColSpec::new("users.first_name", ColType::String),
    "last_name" => ColSpec::new("users.last_name", ColType::String),
    "email" => ColSpec::new("users.email", ColType::String),
    "role" => ColSpec::new("users.role", ColType::Enum),
    "state" => ColSpec::new("users.state", ColType::Enum),
    "created_at" => ColSpec::new("users.created_at", ColType::Date),
};

/// Unique key used for the default order and as the tiebreaker
pub const USERS_KEY_COL: ColSpec = ColSpec::new("users.id", ColType::Id);

#[derive(Debug, Copy, Clone)]
pub struct ColSet {
    col_map: &'static ColMap,
}

impl ColSet {
    pub fn new(col_map: &'static ColMap) -> Self {
        ColSet { col_map }
    }

    pub fn users() -> Self {
        Self::new(&USERS_SORT_COLS)
    }

    pub fn get(&self, column_name: &str) -> Option<&'static ColSpec> {
        self.col_map.get(column_name)
    }

    pub fn names(&self) -> Keys<'static, &'static str, ColSpec> {
        self.col_map.keys()
    }
}
