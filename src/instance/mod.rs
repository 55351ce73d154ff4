//! LocalDB instance management.
//!
//! - `manager` owns the native binding and answers version queries
//! - `crud` creates, queries and deletes instances
//! - `lifecycle` starts, stops, shares and unshares them
//! - `cleanup` bulk-deletes user instances and their files
//! - `handle` and `temporary` wrap a single instance

mod cleanup;
mod crud;
mod handle;
mod lifecycle;
mod manager;
mod temporary;
mod types;

// Re-export types
pub use types::{InstanceInfo, StopInstanceOptions, VersionInfo};

// Re-export the manager
pub use manager::{is_default_instance_name, InstanceManager, AUTOMATIC_INSTANCE_NAME};

// Re-export single-instance wrappers
pub use handle::InstanceHandle;
pub use temporary::TemporaryInstance;
