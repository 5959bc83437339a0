//! Core domain types shared by the osorm query and client crates.

pub mod config;
pub mod error;
pub mod model;

pub use config::SessionConfig;
pub use error::{CoreError, CoreResult};
pub use model::{Document, FieldSet};
