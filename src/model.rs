mod database;
pub mod post;
pub mod session;
pub mod user;

use tera::Tera;
use tokio::sync::Mutex;

use crate::config::Config;

pub use database::Database;
pub use post::Post;
pub use session::Session;
pub use user::User;

/// Everything a request handler needs, shared behind an `Arc`.
pub struct AppState {
    pub database: Mutex<Database>,
    pub templates: Tera,
    pub config: Config,
}

impl AppState {
    pub fn new(database: Database, templates: Tera, config: Config) -> AppState {
        AppState {
            database: Mutex::new(database),
            templates,
            config,
        }
    }
}
