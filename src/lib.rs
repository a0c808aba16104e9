mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod memory;
    pub mod pagination;
    pub mod schema;
    pub mod store;
}
mod authentication {
    pub mod cryptography;
    pub mod identity;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod services {
    pub mod accounts;
    pub mod aggregation;
    pub mod export;
    pub mod filter;
    pub mod ingredients;
    pub mod listing;
    pub mod recipes;
    pub mod slug;
    pub mod toggle;
}
mod api {
    pub mod routes;
}
mod config;
mod constants;

mod cache {
    pub mod cache;
}

pub use api::*;
pub use authentication::*;
pub use cache::cache::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use services::*;
