use chrono::{Duration, NaiveDateTime};
use log::info;
use rusqlite::Connection;

use crate::error::RosterError;
use crate::skills::Skill;
use crate::users::{NewUser, UserState};
use crate::utils::Utils;

const FIRST_NAMES: [&str; 8] = [
    "Ada", "Grace", "Alan", "Barbara", "Edsger", "Margaret", "Donald", "Frances",
];
const LAST_NAMES: [&str; 6] = ["Lovelace", "Hopper", "Turing", "Liskov", "Dijkstra", "Hamilton"];
const SKILL_NAMES: [&str; 8] = [
    "php", "css", "javascript", "rust", "sql", "laravel", "vue", "testing",
];
const SEED_EPOCH: &str = "2018-09-01 09:00:00";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub skills: usize,
}

/// Inserts deterministic demo users and skills inside one transaction.
/// Every 5th user is inactive, every 4th is an admin, and user `n` gets the
/// skills whose index bits are set in `n`.
pub fn seed(conn: &mut Connection, user_count: usize, skill_count: usize) -> Result<SeedSummary, RosterError> {
    let skill_count = skill_count.min(SKILL_NAMES.len());
    let epoch: NaiveDateTime = Utils::parse_db_datetime(SEED_EPOCH)
        .ok_or_else(|| RosterError::Error("Invalid seed epoch".into()))?;

    let tx = conn.transaction()?;

    let mut skill_ids = Vec::with_capacity(skill_count);
    for name in &SKILL_NAMES[..skill_count] {
        skill_ids.push(Skill::get_or_create(&tx, name)?.id);
    }

    let existing: i64 = tx.query_row("SELECT COALESCE(MAX(id), 0) FROM users", [], |row| row.get(0))?;

    for n in 0..user_count {
        let serial = existing + n as i64 + 1;
        let first_name = FIRST_NAMES[n % FIRST_NAMES.len()];
        let last_name = LAST_NAMES[(n / FIRST_NAMES.len()) % LAST_NAMES.len()];
        let email = format!(
            "{}.{}.{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            serial
        );

        let mut new_user = NewUser::new(first_name, last_name, &email, epoch + Duration::hours(serial * 7));
        if serial % 4 == 0 {
            new_user = new_user.with_role("admin");
        }
        if serial % 5 == 0 {
            new_user = new_user.with_state(UserState::Inactive);
        }
        let user_id = new_user.insert(&tx)?;

        let user_skills: Vec<i64> = skill_ids
            .iter()
            .enumerate()
            .filter(|(bit, _)| (serial >> bit) & 1 == 1)
            .map(|(_, id)| *id)
            .collect();
        Skill::attach(&tx, user_id, &user_skills)?;
    }

    tx.commit()?;

    info!("Seeded {} users and {} skills", user_count, skill_count);
    Ok(SeedSummary {
        users: user_count,
        skills: skill_count,
    })
}
