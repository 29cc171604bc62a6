//! Conversational context: per-session memory, reference resolution and
//! background task tracking

pub mod manager;
pub mod resolver;
pub mod session;
pub mod state;
pub mod tasks;

pub use manager::{ContextManager, ContextStatus};
pub use session::{SessionHandle, SessionStore};
pub use state::{ContextState, Preferences, Turn};
pub use tasks::{TaskEvent, TaskInfo, TaskRegistry};
