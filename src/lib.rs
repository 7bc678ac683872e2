pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod markdown;
pub mod middleware;
pub mod router;

pub use config::Config;
pub use db::BlogStorage;
pub use error::BlogError;
