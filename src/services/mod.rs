pub mod activity;
pub use activity::{ActivitySink, StoreActivitySink};

pub mod catalog;
pub use catalog::{CatalogResolver, ResolveError};

pub mod filter;
pub use filter::{FilterDecision, KeywordFilter};

pub mod image;
pub use image::PosterStore;

pub mod ingest;
pub use ingest::{
    IngestError, IngestOptions, IngestService, ItemError, ItemOutcome, ScanReport, SourceReport,
};

pub mod settings;
pub use settings::{SettingsProvider, StaticSettings, StoreSettingsProvider};

pub mod worker_pool;
pub use worker_pool::WorkerPool;
