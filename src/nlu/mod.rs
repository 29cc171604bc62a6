//! Natural-language understanding: rules, entity extraction, classification

pub mod entities;
pub mod intent;
pub mod rules;
pub mod secondary;

pub use entities::EntityExtractor;
pub use intent::{IntentClassifier, IntentInfo, Stage};
pub use secondary::{SecondaryMatcher, TopicHint};
