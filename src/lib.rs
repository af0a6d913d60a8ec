pub mod asset;
pub mod error;
pub mod model;
pub mod task;
pub mod ui;

pub use error::{Result, StyleError};
