//! Configuration for the ingestion pipeline.

mod settings;

pub use settings::Config;
