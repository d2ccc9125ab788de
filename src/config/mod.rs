// src/config/mod.rs

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_or_default};
pub use model::{Config, RawConfigFile};
