//! # refcat Common Library
//!
//! Shared code for the refcat catalog service including:
//! - Item-type taxonomy (families and display colors)
//! - Raw upstream records and derived resources
//! - The item transformer
//! - Catalog helpers (deduplication, grouping, stats, card/detail views)
//! - Filter helpers
//! - Collection version stores
//! - Configuration loading

pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod model;
pub mod taxonomy;
pub mod transform;
pub mod versions;

pub use error::{Error, Result};
pub use model::{RawItem, Resource};
pub use taxonomy::Family;
