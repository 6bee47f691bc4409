//! Rotacast - rotation-scheduled image publishing for the social web
//!
//! This library selects one catalog item per invocation via a persisted
//! rotation queue, renders its image, and fans the result out to every
//! configured destination platform with per-destination failure isolation.

pub mod catalog;
pub mod config;
pub mod error;
pub mod exclusions;
pub mod logging;
pub mod platforms;
pub mod publisher;
pub mod render;
pub mod rotation;
pub mod run;
pub mod types;

// Re-export commonly used types
pub use catalog::{Catalog, Item};
pub use config::Config;
pub use error::{Result, RotacastError};
pub use exclusions::ExclusionSet;
pub use publisher::FanoutPublisher;
pub use rotation::{RotationQueue, Selection};
pub use run::{run_from_config, RunMode};
pub use types::{PublishOutcome, RenderedArtifact, RunReport};
