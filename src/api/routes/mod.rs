pub mod skills;
pub mod users;
