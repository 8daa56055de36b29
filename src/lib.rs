pub mod api;
pub mod controllers;
pub mod error;
pub mod helpers;
pub mod provider;
pub mod server;

pub use error::{Error, Result};
