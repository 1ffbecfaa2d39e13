//! Chatty API: serverless-friendly HTTP entrypoint with a lazily
//! established, single-flight MongoDB connection.

pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use db::{ConnectionCache, Connector, MongoConnector};
pub use http::{HttpServer, RouteGroups};
pub use lifecycle::Shutdown;
