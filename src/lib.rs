// src/lib.rs
// =============================================================================
// follow-graph: crawl a social follow graph breadth-first and record every
// profile and follow edge found within a depth limit.
//
// Layout:
// - crawl: the concurrent traversal engine
// - fetch: the PageFetcher trait and its HTTP implementation
// - store: the PersistenceSink trait, SQLite and in-memory implementations
// - model: handles and profile data shared by all of the above
// - config: settings read from the environment
// - error: typed errors for the library
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod fetch;
pub mod model;
pub mod store;

pub use crawl::{run, CrawlConfig, CrawlReport, Crawler};
pub use error::{CrawlError, FetchError, PersistError};
pub use fetch::{HttpFetcher, PageFetcher};
pub use model::{IdentityKey, PlanTier, ProfileAttributes};
pub use store::{MemorySink, PersistenceSink, Person, SqliteStore};
