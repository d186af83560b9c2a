use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use crate::api::users::build_users_response;
use crate::config::Config;
use crate::database::Database;
use crate::error::RosterError;
use crate::seed;

#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "roster: browse users with filters, sorting and pagination"
)]
pub struct Cli {
    /// Directory holding the database (overrides the configured path)
    #[arg(long = "db-dir", short = 'd', global = true)]
    pub db_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (default if no command specified)
    Serve,

    /// Print one page of users as JSON, using the same query string the web listing accepts
    List {
        /// Query string, e.g. "state=active&skills[]=1&order=first_name-desc&page=2"
        #[arg(long = "query", short = 'q', default_value = "")]
        query: String,
    },

    /// Insert deterministic demo users and skills
    Seed {
        /// Number of users to create
        #[arg(long = "users", short = 'u', default_value_t = 40)]
        users: usize,

        /// Number of skills to create (at most 8)
        #[arg(long = "skills", short = 's', default_value_t = 4)]
        skills: usize,
    },
}

impl Cli {
    pub fn handle_command_line(default_db_dir: PathBuf) -> Result<(), RosterError> {
        let args = Cli::parse();

        let db_dir = args
            .db_dir
            .or_else(Config::get_database_dir)
            .unwrap_or(default_db_dir);
        Database::init(&db_dir, Config::get_pool_size())?;

        // Default to Serve if no command specified
        match args.command.unwrap_or(Command::Serve) {
            Command::Serve => Self::start_server(),
            Command::List { query } => Self::list(&query),
            Command::Seed { users, skills } => Self::seed(users, skills),
        }
    }

    fn start_server() -> Result<(), RosterError> {
        let host = Config::get_server_host();
        let port = Config::get_server_port();

        info!("Starting server on {}:{}", host, port);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| RosterError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = crate::server::WebServer::new(host, port);
            web_server.start().await
        })
    }

    fn list(query: &str) -> Result<(), RosterError> {
        let conn = Database::get_connection()?;
        let response = build_users_response(&conn, Some(query), Config::get_page_size())?;

        let json = serde_json::to_string_pretty(&response)
            .map_err(|e| RosterError::Error(format!("Failed to serialize listing: {}", e)))?;
        println!("{json}");
        Ok(())
    }

    fn seed(users: usize, skills: usize) -> Result<(), RosterError> {
        let mut conn = Database::get_connection()?;
        let summary = seed::seed(&mut conn, users, skills)?;
        println!(
            "Seeded {} users and {} skills",
            summary.users, summary.skills
        );
        Ok(())
    }
}
