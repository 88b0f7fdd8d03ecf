pub mod config;
pub mod download;
pub mod driver;
pub mod error;
pub mod github;
pub mod http;
pub mod migrate;
pub mod notes;
pub mod runtime;
pub mod transfer;
