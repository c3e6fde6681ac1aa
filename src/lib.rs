mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod memory;
    pub mod pagination;
    pub mod postgres;
    pub mod schema;
    pub mod store;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod config;
mod constants;
mod response;

pub use actions::*;
pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use response::*;
pub use store::Store;
