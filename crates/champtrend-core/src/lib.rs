pub mod app_config;
pub mod config;
pub mod run;
pub mod snapshots;
pub mod tags;
pub mod trend;

pub use app_config::AppConfig;
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use run::{RunResult, RunStage, RunStatus};
pub use snapshots::{
    EntitySnapshot, HistoryPoint, LatestRow, MetricSnapshot, ObservedPoint, MAX_ATTRIBUTE_VALUE,
};
pub use tags::{decode_tags, encode_tags};
pub use trend::{growth_rate, rank_leaderboard, top_entity};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("attribute value {value} for {entity_name} is out of range 0..={max}")]
    AttributeOutOfRange {
        entity_name: String,
        value: i64,
        max: u8,
    },

    #[error("entity name must not be empty")]
    EmptyEntityName,
}
