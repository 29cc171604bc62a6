pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AssistantConfig, LlmSettings};
pub use error::{Result, ZeroError};
