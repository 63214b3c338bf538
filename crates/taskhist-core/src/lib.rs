pub mod error;
pub mod id;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use id::TaskId;
pub use task::{Task, TaskFields, TaskPatch, TaskPriority, TaskStatus, MAX_TITLE_LEN};
