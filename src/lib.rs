//! Zero - intent classification, entity extraction, context resolution and
//! skill routing for a conversational assistant

pub mod context;
pub mod core;
pub mod llm;
pub mod nlu;
pub mod pipeline;
pub mod skills;

pub use crate::core::{AssistantConfig, Result, ZeroError};
pub use crate::pipeline::{Assistant, PipelineResult};
