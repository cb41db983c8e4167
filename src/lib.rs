mod database {
    pub mod actions;
    pub mod error;
    pub mod memory;
    pub mod postgres;
    pub mod schema;
    pub mod store;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
}
mod api {
    pub mod handlers;
    pub mod recover;
    pub mod routes;
}
mod constants;

pub mod config;
pub mod state;
pub mod transfer;
pub mod uploads;

pub use api::recover::recover;
pub use api::routes::routes;
pub use authentication::*;
pub use constants::*;
pub use database::*;
