pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
