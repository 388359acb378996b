pub mod batch;
pub mod bilibili;
pub mod client;
pub mod collector;
pub mod ddragon;
pub mod error;
pub mod politeness;
pub(crate) mod retry;
pub mod types;

pub use batch::{Batch, EntityOutcome, SkippedEntity};
pub use bilibili::BilibiliCollector;
pub use client::build_http_client;
pub use collector::{MetricCollector, ReferenceCollector};
pub use ddragon::DataDragonCollector;
pub use error::ScraperError;
pub use politeness::PolitenessDelay;
