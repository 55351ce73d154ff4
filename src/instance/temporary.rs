//! Instances that live for the duration of a scope.

use super::manager::InstanceManager;
use super::types::InstanceInfo;
use crate::error::{ErrorKind, Result, SqlLocalDbError};
use crate::native::{NativeApi, NativeApiBinding, NativeStatus};

/// A started instance that is stopped and deleted when dropped.
///
/// Teardown never fails: errors while stopping or deleting are logged.
/// Accessors fail with [`ErrorKind::AlreadyDisposed`] after
/// [`dispose`](Self::dispose).
pub struct TemporaryInstance<'a, A: NativeApi = NativeApiBinding> {
    manager: &'a InstanceManager<A>,
    name: String,
    delete_files: bool,
    disposed: bool,
}

impl<'a, A: NativeApi> TemporaryInstance<'a, A> {
    /// Create and start an instance named `name`, or a random unique name.
    ///
    /// If the instance cannot be started it is deleted again before the
    /// start error is returned.
    pub fn create(
        manager: &'a InstanceManager<A>,
        name: Option<&str>,
        delete_files: bool,
    ) -> Result<Self> {
        let name = name.map_or_else(|| uuid::Uuid::new_v4().to_string(), ToString::to_string);

        manager.create_instance(&name, None)?;
        if let Err(e) = manager.start_instance(&name) {
            log::warn!("Temporary LocalDB instance {} failed to start, deleting it", name);
            if let Err(cleanup) = manager.delete_instance_with(&name, delete_files, false) {
                log::warn!(
                    "Failed to delete temporary LocalDB instance {}: {}",
                    name,
                    cleanup
                );
            }
            return Err(e);
        }

        log::debug!("Temporary LocalDB instance {} is running", name);
        Ok(Self {
            manager,
            name,
            delete_files,
            disposed: false,
        })
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            return Err(SqlLocalDbError::already_disposed("TemporaryInstance")
                .with_instance(self.name.as_str()));
        }
        Ok(())
    }

    pub fn name(&self) -> Result<&str> {
        self.ensure_live()?;
        Ok(&self.name)
    }

    pub fn manager(&self) -> Result<&'a InstanceManager<A>> {
        self.ensure_live()?;
        Ok(self.manager)
    }

    /// Current state of the instance.
    pub fn get_instance_info(&self) -> Result<InstanceInfo> {
        self.ensure_live()?;
        self.manager.get_instance_info(&self.name)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stop and delete the instance. Calling this again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        match self.manager.stop_instance(&self.name) {
            Ok(()) => {}
            Err(e) if e.has_status(NativeStatus::UNKNOWN_INSTANCE) => {
                log::debug!("Temporary LocalDB instance {} no longer exists", self.name);
            }
            Err(e) => {
                log::warn!(
                    "Failed to stop temporary LocalDB instance {}: {}",
                    self.name,
                    e
                );
            }
        }

        match self
            .manager
            .delete_instance_with(&self.name, self.delete_files, false)
        {
            Ok(_) => log::debug!("Temporary LocalDB instance {} deleted", self.name),
            Err(e) if matches!(e.kind(), ErrorKind::Busy | ErrorKind::InternalError) => {
                log::debug!(
                    "Temporary LocalDB instance {} could not be deleted yet: {}",
                    self.name,
                    e
                );
            }
            Err(e) => {
                log::warn!(
                    "Failed to delete temporary LocalDB instance {}: {}",
                    self.name,
                    e
                );
            }
        }
    }
}

impl<A: NativeApi> Drop for TemporaryInstance<'_, A> {
    fn drop(&mut self) {
        self.dispose();
    }
}
