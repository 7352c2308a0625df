pub mod gate;
pub mod hardware;
pub mod matcher;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod render;
pub mod selector;
pub mod transfer_engine;

pub use hardware::{HardwareAdapter, unmount_all};
pub use matcher::{MatchConstraint, MatchOutcome, MatchReport, MatchResult};
pub use models::DeviceRecord;
pub use orchestrator::{FlashOutcome, Orchestrator};
pub use prompt::{Prompter, ScriptedPrompter, StdinPrompter};
