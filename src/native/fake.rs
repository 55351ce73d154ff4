//! In-memory LocalDB API used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{NativeApi, NativeResult, NativeStatus, NativeVersion};
use crate::instance::{InstanceInfo, StopInstanceOptions, VersionInfo};

#[derive(Default)]
struct State {
    /// Keyed by upper-cased name.
    instances: HashMap<String, InstanceInfo>,
    failures: HashMap<&'static str, Vec<NativeStatus>>,
    calls: Vec<String>,
    tracing: bool,
}

/// A LocalDB stand-in with scripted failures and a call log.
pub(crate) struct FakeNativeApi {
    version: Option<NativeVersion>,
    versions: Vec<String>,
    /// Language ids `format_message` accepts.
    languages: Vec<u32>,
    state: Mutex<State>,
}

impl FakeNativeApi {
    /// LocalDB with the given versions installed, bound to the last one.
    pub fn new(versions: &[&str]) -> Self {
        Self {
            version: versions.last().and_then(|v| NativeVersion::parse(v)),
            versions: versions.iter().map(ToString::to_string).collect(),
            languages: vec![0],
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_languages(mut self, languages: &[u32]) -> Self {
        self.languages = languages.to_vec();
        self
    }

    /// Register an existing instance.
    pub fn with_instance(self, name: &str, automatic: bool) -> Self {
        {
            let mut state = self.lock();
            let mut info = Self::new_info(name, self.version);
            info.is_automatic = automatic;
            state.instances.insert(name.to_uppercase(), info);
        }
        self
    }

    /// Make the next call of `op` fail with `status`. Repeated calls queue;
    /// a queued `SUCCESS` lets that call through.
    pub fn fail_next(&self, op: &'static str, status: NativeStatus) {
        self.lock().failures.entry(op).or_default().push(status);
    }

    /// Operation log, e.g. `["create Alpha", "start Alpha"]`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn has_instance(&self, name: &str) -> bool {
        self.lock().instances.contains_key(&name.to_uppercase())
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.lock()
            .instances
            .get(&name.to_uppercase())
            .is_some_and(|i| i.is_running)
    }

    pub fn is_tracing(&self) -> bool {
        self.lock().tracing
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn new_info(name: &str, version: Option<NativeVersion>) -> InstanceInfo {
        let mut info = InstanceInfo::missing(name);
        info.exists = true;
        info.owner_sid = "S-1-5-21-1-2-3-1001".to_string();
        info.version = version;
        info
    }

    /// Log the call and pop any scripted failure for it.
    fn enter(&self, op: &'static str, detail: &str) -> NativeResult<std::sync::MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(if detail.is_empty() {
            op.to_string()
        } else {
            format!("{} {}", op, detail)
        });
        if let Some(queue) = state.failures.get_mut(op) {
            if !queue.is_empty() {
                let status = queue.remove(0);
                if status != NativeStatus::SUCCESS {
                    return Err(status);
                }
            }
        }
        Ok(state)
    }

    fn check_name(name: &str) -> NativeResult<()> {
        if name.is_empty() || name.len() > 128 || name.contains(['\\', '/']) {
            return Err(NativeStatus::INVALID_INSTANCE_NAME);
        }
        Ok(())
    }
}

impl NativeApi for FakeNativeApi {
    fn version(&self) -> Option<NativeVersion> {
        self.version
    }

    fn probe(&self) -> NativeStatus {
        match self.enter("probe", "") {
            Ok(_) if self.versions.is_empty() => NativeStatus::SUCCESS,
            Ok(_) => NativeStatus::INSUFFICIENT_BUFFER,
            Err(status) => status,
        }
    }

    fn create_instance(&self, version: &str, name: &str) -> NativeResult<()> {
        let mut state = self.enter("create", name)?;
        Self::check_name(name)?;
        if !self.versions.iter().any(|v| v == version) {
            return Err(NativeStatus::VERSION_NOT_INSTALLED);
        }
        let key = name.to_uppercase();
        if state.instances.contains_key(&key) {
            // LocalDB treats creating an existing instance as success.
            return Ok(());
        }
        let info = Self::new_info(name, NativeVersion::parse(version));
        state.instances.insert(key, info);
        Ok(())
    }

    fn delete_instance(&self, name: &str) -> NativeResult<()> {
        let mut state = self.enter("delete", name)?;
        Self::check_name(name)?;
        match state.instances.get(&name.to_uppercase()) {
            None => Err(NativeStatus::UNKNOWN_INSTANCE),
            Some(info) if info.is_running => Err(NativeStatus::INSTANCE_BUSY),
            Some(_) => {
                state.instances.remove(&name.to_uppercase());
                Ok(())
            }
        }
    }

    fn instance_info(&self, name: &str) -> NativeResult<InstanceInfo> {
        let state = self.enter("info", name)?;
        Self::check_name(name)?;
        state
            .instances
            .get(&name.to_uppercase())
            .cloned()
            .ok_or(NativeStatus::UNKNOWN_INSTANCE)
    }

    fn instance_names(&self) -> NativeResult<Vec<String>> {
        let state = self.enter("names", "")?;
        let mut names: Vec<String> = state.instances.values().map(|i| i.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    fn version_info(&self, version: &str) -> NativeResult<VersionInfo> {
        let _state = self.enter("version_info", version)?;
        if !self.versions.iter().any(|v| v == version) {
            return Err(NativeStatus::VERSION_NOT_INSTALLED);
        }
        Ok(VersionInfo {
            name: version.to_string(),
            exists: true,
            version: NativeVersion::parse(version),
        })
    }

    fn versions(&self) -> NativeResult<Vec<String>> {
        let _state = self.enter("versions", "")?;
        Ok(self.versions.clone())
    }

    fn share_instance(
        &self,
        owner_sid: &[u8],
        name: &str,
        shared_name: &str,
    ) -> NativeResult<()> {
        let mut state = self.enter("share", name)?;
        if owner_sid.len() < 8 {
            return Err(NativeStatus::INVALID_PARAMETER);
        }
        let info = state
            .instances
            .get_mut(&name.to_uppercase())
            .ok_or(NativeStatus::UNKNOWN_INSTANCE)?;
        info.is_shared = true;
        info.shared_name = shared_name.to_string();
        Ok(())
    }

    fn start_instance(&self, name: &str) -> NativeResult<String> {
        let mut state = self.enter("start", name)?;
        let info = state
            .instances
            .get_mut(&name.to_uppercase())
            .ok_or(NativeStatus::UNKNOWN_INSTANCE)?;
        info.is_running = true;
        info.named_pipe = format!(r"np:\\.\pipe\LOCALDB#{}\tsql\query", name.len());
        Ok(info.named_pipe.clone())
    }

    fn stop_instance(
        &self,
        name: &str,
        options: StopInstanceOptions,
        timeout_secs: u32,
    ) -> NativeResult<()> {
        let detail = format!("{} flags={} timeout={}", name, options.bits(), timeout_secs);
        let mut state = self.enter("stop", &detail)?;
        let info = state
            .instances
            .get_mut(&name.to_uppercase())
            .ok_or(NativeStatus::UNKNOWN_INSTANCE)?;
        info.is_running = false;
        info.named_pipe.clear();
        Ok(())
    }

    fn start_tracing(&self) -> NativeResult<()> {
        self.enter("start_tracing", "")?.tracing = true;
        Ok(())
    }

    fn stop_tracing(&self) -> NativeResult<()> {
        self.enter("stop_tracing", "")?.tracing = false;
        Ok(())
    }

    fn unshare_instance(&self, name: &str) -> NativeResult<()> {
        let mut state = self.enter("unshare", name)?;
        let info = state
            .instances
            .get_mut(&name.to_uppercase())
            .ok_or(NativeStatus::UNKNOWN_INSTANCE)?;
        if !info.is_shared {
            return Err(NativeStatus::INSTANCE_NOT_SHARED);
        }
        info.is_shared = false;
        info.shared_name.clear();
        Ok(())
    }

    fn format_message(&self, status: NativeStatus, language_id: u32) -> NativeResult<String> {
        let _state = self.enter("format", &language_id.to_string())?;
        if !self.languages.contains(&language_id) {
            return Err(NativeStatus::UNKNOWN_LANGUAGE_ID);
        }
        let name = status.name().ok_or(NativeStatus::UNKNOWN_ERROR_CODE)?;
        Ok(format!("LocalDB error {} (language {})", name, language_id))
    }
}
