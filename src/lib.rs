pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod lineage;
pub mod metadata;
pub mod normalize;
pub mod output;
pub mod query;
pub mod reconcile;
pub mod snapshot;
pub mod supply;
