//! Operations bound to a single instance.

use super::manager::InstanceManager;
use super::types::InstanceInfo;
use crate::error::Result;
use crate::native::NativeApi;

/// Drives one instance and keeps its [`InstanceInfo`] current.
///
/// Every successful operation refreshes the held info in place.
pub struct InstanceHandle<'a, A: NativeApi> {
    manager: &'a InstanceManager<A>,
    info: InstanceInfo,
}

impl<'a, A: NativeApi> InstanceHandle<'a, A> {
    pub(super) fn new(manager: &'a InstanceManager<A>, info: InstanceInfo) -> Self {
        Self { manager, info }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// The info as of the last refresh.
    pub fn info(&self) -> &InstanceInfo {
        &self.info
    }

    pub fn manager(&self) -> &'a InstanceManager<A> {
        self.manager
    }

    /// Re-query the instance state.
    pub fn refresh(&mut self) -> Result<&InstanceInfo> {
        let fresh = self.manager.get_instance_info(&self.info.name)?;
        self.info.refresh_from(Some(&fresh));
        Ok(&self.info)
    }

    fn after<T>(&mut self, operation: &str, result: Result<T>) -> Result<T> {
        let value = result
            .map_err(|e| e.context(format!("Failed to {} instance '{}'", operation, self.info.name)))?;
        self.refresh()?;
        Ok(value)
    }

    /// Start the instance, returning its named pipe.
    pub fn start(&mut self) -> Result<String> {
        let result = self.manager.start_instance(&self.info.name);
        self.after("start", result)
    }

    /// Stop the instance with the manager's configured options.
    pub fn stop(&mut self) -> Result<()> {
        let result = self.manager.stop_instance(&self.info.name);
        self.after("stop", result)
    }

    pub fn restart(&mut self) -> Result<String> {
        self.stop()?;
        self.start()
    }

    pub fn share(&mut self, owner_sid: &str, shared_name: &str) -> Result<()> {
        let result = self
            .manager
            .share_instance(owner_sid, &self.info.name, shared_name);
        self.after("share", result)
    }

    pub fn unshare(&mut self) -> Result<()> {
        let result = self.manager.unshare_instance(&self.info.name);
        self.after("unshare", result)
    }
}
