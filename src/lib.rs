pub mod config;
pub mod db;
pub mod error;
pub mod parser;
pub mod schema;
pub mod service;
pub mod sql;

pub use error::PrefillerError;
