//! Harvester core: pure session state machine and harvest configuration.
mod config;
mod msg;
mod outcome;
mod resumption;
mod state;
mod update;

pub use config::{date_only, parse_datestamp, ConfigError, Datestamp, HarvestConfig, HarvestQuery};
pub use msg::{Msg, RequestKind};
pub use outcome::StepOutcome;
pub use resumption::ResumptionInfo;
pub use state::SessionState;
pub use update::{page_stored, update, TransitionError};
