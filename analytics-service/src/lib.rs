pub mod analytics;
pub mod config;
pub mod observability;
pub mod pipeline;
pub mod sources;
pub mod transform;
pub mod views;

pub use pipeline::{evaluate, Selection};
