pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod intent;
pub mod orchestrator;
pub mod retrieval;
pub mod specialists;
pub mod structured;
pub mod team_code;

pub use error::{EngineError, Result};
