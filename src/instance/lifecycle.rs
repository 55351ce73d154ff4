//! Instance lifecycle management (start/stop/share/unshare).

use std::time::Duration;

use super::manager::InstanceManager;
use super::types::StopInstanceOptions;
use crate::config::timeout_secs;
use crate::error::Result;
use crate::native::{parse_sid, NativeApi};
use crate::validation::{require_non_empty, validate_instance_name};

impl<A: NativeApi> InstanceManager<A> {
    /// Start `name`, returning the named pipe to connect to.
    pub fn start_instance(&self, name: &str) -> Result<String> {
        validate_instance_name(name)?;
        log::debug!("Starting LocalDB instance {}", name);
        let result = self.api().start_instance(name);
        let pipe = self.check("start instance", Some(name), result)?;
        log::info!("Started LocalDB instance {} on {}", name, pipe);
        Ok(pipe)
    }

    /// Stop `name` with the configured stop options and timeout.
    pub fn stop_instance(&self, name: &str) -> Result<()> {
        let options = self.options();
        self.stop_instance_with(name, options.stop_options, options.stop_timeout)
    }

    /// Stop `name`, waiting up to `timeout` (whole seconds; zero returns
    /// immediately).
    pub fn stop_instance_with(
        &self,
        name: &str,
        options: StopInstanceOptions,
        timeout: Duration,
    ) -> Result<()> {
        validate_instance_name(name)?;
        let secs = timeout_secs(timeout);
        log::debug!(
            "Stopping LocalDB instance {} (flags {}, timeout {}s)",
            name,
            options.bits(),
            secs
        );
        let result = self.api().stop_instance(name, options, secs);
        self.check("stop instance", Some(name), result)?;
        log::info!("Stopped LocalDB instance {}", name);
        Ok(())
    }

    /// Share `name` under `shared_name` for the user identified by
    /// `owner_sid` (string form, e.g. `S-1-5-21-...`).
    pub fn share_instance(&self, owner_sid: &str, name: &str, shared_name: &str) -> Result<()> {
        require_non_empty("owner_sid", owner_sid)?;
        validate_instance_name(name)?;
        require_non_empty("shared_name", shared_name)?;
        let sid = parse_sid(owner_sid)?;

        log::debug!("Sharing LocalDB instance {} as {}", name, shared_name);
        let result = self.api().share_instance(&sid, name, shared_name);
        self.check("share instance", Some(name), result)?;
        log::info!("Shared LocalDB instance {} as {}", name, shared_name);
        Ok(())
    }

    pub fn unshare_instance(&self, name: &str) -> Result<()> {
        validate_instance_name(name)?;
        log::debug!("Unsharing LocalDB instance {}", name);
        let result = self.api().unshare_instance(name);
        self.check("unshare instance", Some(name), result)?;
        log::info!("Unshared LocalDB instance {}", name);
        Ok(())
    }
}
