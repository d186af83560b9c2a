pub mod routes;

// Re-export route handlers for convenience
pub use routes::skills;
pub use routes::users;
