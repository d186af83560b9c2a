use std::collections::HashMap;

use rusqlite::{params_from_iter, Connection, Row};
use serde::Serialize;

use crate::error::RosterError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

impl Skill {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Skill {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    /// Returns the skill named `name`, inserting it first if it doesn't exist
    pub fn get_or_create(conn: &Connection, name: &str) -> Result<Skill, RosterError> {
        conn.execute("INSERT OR IGNORE INTO skills (name) VALUES (?)", [name])?;
        let skill = conn.query_row(
            "SELECT id, name FROM skills WHERE name = ?",
            [name],
            Skill::from_row,
        )?;
        Ok(skill)
    }

    /// All skills ordered by name, for populating the filter form
    pub fn get_all(conn: &Connection) -> Result<Vec<Skill>, RosterError> {
        let mut stmt = conn.prepare("SELECT id, name FROM skills ORDER BY name COLLATE NOCASE, id")?;
        let skills = stmt
            .query_map([], Skill::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(skills)
    }

    /// Associates the user with each skill. Existing associations are left alone.
    pub fn attach(conn: &Connection, user_id: i64, skill_ids: &[i64]) -> Result<(), RosterError> {
        let mut stmt =
            conn.prepare("INSERT OR IGNORE INTO user_skill (user_id, skill_id) VALUES (?, ?)")?;
        for skill_id in skill_ids {
            stmt.execute([user_id, *skill_id])?;
        }
        Ok(())
    }

    /// Skill names per user, each list ordered by name. Users without skills are absent.
    pub fn names_for_users(
        conn: &Connection,
        user_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<String>>, RosterError> {
        let mut names: HashMap<i64, Vec<String>> = HashMap::new();
        if user_ids.is_empty() {
            return Ok(names);
        }

        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!(
            "SELECT user_skill.user_id, skills.name
             FROM user_skill
             JOIN skills ON skills.id = user_skill.skill_id
             WHERE user_skill.user_id IN ({placeholders})
             ORDER BY user_skill.user_id, skills.name COLLATE NOCASE"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(user_ids.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (user_id, name) = row?;
            names.entry(user_id).or_default().push(name);
        }

        Ok(names)
    }
}
