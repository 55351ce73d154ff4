//! Discover, bind and drive the SQL Server LocalDB instance API.
//!
//! ```no_run
//! use sqllocaldb::{InstanceManager, SqlLocalDbOptions};
//!
//! let manager = InstanceManager::new(SqlLocalDbOptions::default());
//! if manager.is_installed() {
//!     let temp = manager.create_temporary_instance(false)?;
//!     println!("{}", temp.get_instance_info()?.named_pipe);
//! }
//! # Ok::<(), sqllocaldb::SqlLocalDbError>(())
//! ```

mod config;
mod error;
mod instance;
pub mod native;
mod paths;
mod translator;
mod validation;

pub use config::SqlLocalDbOptions;
pub use error::{ErrorKind, Result, SqlLocalDbError};
pub use instance::{
    is_default_instance_name, InstanceHandle, InstanceInfo, InstanceManager,
    StopInstanceOptions, TemporaryInstance, VersionInfo, AUTOMATIC_INSTANCE_NAME,
};
pub use native::{NativeApi, NativeStatus, NativeVersion};
pub use paths::default_instances_root;
pub use translator::{format_message, translate};
pub use validation::MAX_INSTANCE_NAME_LEN;
