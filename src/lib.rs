pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod notify;
pub mod poller;
pub mod shutdown;
pub mod validate;

pub use error::{HeraldError, Result};
