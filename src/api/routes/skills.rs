use axum::{http::StatusCode, Json};
use log::error;

use crate::database::Database;
use crate::skills::Skill;

/// GET /api/skills
/// All skills ordered by name, used to build the skills filter
pub async fn list_skills() -> Result<Json<Vec<Skill>>, StatusCode> {
    let conn = Database::get_connection().map_err(|e| {
        error!("Failed to get database connection: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match Skill::get_all(&conn) {
        Ok(skills) => Ok(Json(skills)),
        Err(e) => {
            error!("Failed to list skills: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
