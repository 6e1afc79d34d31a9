pub mod config;
mod error;
pub mod io_utils;
pub mod serde;

pub use error::*;
