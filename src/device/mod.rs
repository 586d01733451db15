//! Device Registry: named handles to power-switch drivers (spec.md §4.5).
//!
//! The concrete transport (key-exchange handshake + encrypted RPC in
//! `original_source/src/devices/`) is opaque to the core; the core only
//! needs a success/failure signal and a post-command state query.

use crate::common::constants::DEFAULT_DEVICE_RETRY_ATTEMPTS;
use crate::error::CoreError;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: String,
    pub display_name: String,
    pub brand: String,
    pub model: String,
    pub address: String,
}

/// Capability set a concrete driver must implement (spec.md §4.5). Object
/// safe so the registry can hold `Box<dyn DeviceDriver>` per brand.
#[cfg_attr(any(test, feature = "testing-support"), mockall::automock)]
pub trait DeviceDriver: Send {
    fn get_info(&self) -> DeviceInfo;
    fn connect(&mut self) -> Result<(), CoreError>;
    fn close(&mut self);
    fn is_connected(&self) -> bool;
    /// Issues the "on" command once. Returns `Ok(())` on an acknowledged
    /// command, `Err` on transport failure — callers retry, never this fn.
    fn send_on(&mut self) -> Result<(), CoreError>;
    fn send_off(&mut self) -> Result<(), CoreError>;
    /// Queries live device state. `Err` means the query itself failed.
    fn is_device_on(&mut self) -> Result<bool, CoreError>;
}

/// No-op driver for `brand` values with nothing to talk to yet, and for
/// tests that only need a handle to exist.
pub struct NullDriver {
    info: DeviceInfo,
    connected: bool,
    on: bool,
}

impl NullDriver {
    pub fn new(info: DeviceInfo) -> Self {
        NullDriver { info, connected: false, on: false }
    }
}

impl DeviceDriver for NullDriver {
    fn get_info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn connect(&mut self) -> Result<(), CoreError> {
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send_on(&mut self) -> Result<(), CoreError> {
        self.on = true;
        Ok(())
    }

    fn send_off(&mut self) -> Result<(), CoreError> {
        self.on = false;
        Ok(())
    }

    fn is_device_on(&mut self) -> Result<bool, CoreError> {
        Ok(self.on)
    }
}

/// A named, registry-owned handle wrapping one driver with the retry/verify
/// policy of spec.md §4.5.
pub struct DeviceHandle {
    driver: Box<dyn DeviceDriver>,
    retry_attempts: u32,
}

impl DeviceHandle {
    pub fn new(driver: Box<dyn DeviceDriver>) -> Self {
        DeviceHandle { driver, retry_attempts: DEFAULT_DEVICE_RETRY_ATTEMPTS }
    }

    pub fn info(&self) -> DeviceInfo {
        self.driver.get_info()
    }

    pub fn connect(&mut self) -> Result<(), CoreError> {
        self.driver.connect()
    }

    pub fn close(&mut self) {
        self.driver.close();
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_connected()
    }

    /// Attempts the command up to the retry budget; when `verify` is set,
    /// an attempt only counts as success if a post-command state query
    /// confirms it. Never raises — returns a plain success boolean
    /// (spec.md §4.5).
    pub fn turn_on(&mut self, verify: bool) -> bool {
        self.command(true, verify)
    }

    pub fn turn_off(&mut self, verify: bool) -> bool {
        self.command(false, verify)
    }

    fn command(&mut self, want_on: bool, verify: bool) -> bool {
        let device_id = self.driver.get_info().device_id;
        for attempt in 1..=self.retry_attempts {
            let sent = if want_on { self.driver.send_on() } else { self.driver.send_off() };
            if let Err(e) = sent {
                crate::log_warn!("device {} command attempt {}/{} failed: {}", device_id, attempt, self.retry_attempts, e);
                continue;
            }
            if !verify {
                return true;
            }
            match self.driver.is_device_on() {
                Ok(state) if state == want_on => return true,
                Ok(_) => {
                    crate::log_warn!("device {} verify mismatch on attempt {}/{}", device_id, attempt, self.retry_attempts);
                }
                Err(e) => {
                    crate::log_warn!("device {} verify query failed on attempt {}/{}: {}", device_id, attempt, self.retry_attempts, e);
                }
            }
        }
        crate::log_error!("device {} failed to reach state on={} after {} attempts", device_id, want_on, self.retry_attempts);
        false
    }

    /// Query state; if on, attempt `turn_off(verify=true)`. Returns true
    /// iff confirmed off (spec.md §4.5).
    pub fn ensure_off(&mut self) -> bool {
        match self.driver.is_device_on() {
            Ok(false) => true,
            Ok(true) => self.turn_off(true),
            Err(_) => self.turn_off(true),
        }
    }
}

/// Mapping from `device_id` to its handle (spec.md §4.5).
#[derive(Default)]
pub struct DeviceRegistry {
    handles: HashMap<String, DeviceHandle>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        DeviceRegistry { handles: HashMap::new() }
    }

    pub fn register(&mut self, device_id: impl Into<String>, handle: DeviceHandle) {
        self.handles.insert(device_id.into(), handle);
    }

    pub fn get_mut(&mut self, device_id: &str) -> Option<&mut DeviceHandle> {
        self.handles.get_mut(device_id)
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceHandle> {
        self.handles.get(device_id)
    }

    pub fn ensure_all_off(&mut self) {
        for (device_id, handle) in self.handles.iter_mut() {
            if !handle.ensure_off() {
                crate::log_error!("device {} could not be confirmed off during shutdown", device_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str) -> DeviceInfo {
        DeviceInfo {
            device_id: id.to_string(),
            display_name: "Test Plug".to_string(),
            brand: "generic".to_string(),
            model: "v1".to_string(),
            address: "10.0.0.5".to_string(),
        }
    }

    #[test]
    fn null_driver_round_trips() {
        let mut handle = DeviceHandle::new(Box::new(NullDriver::new(info("d1"))));
        handle.connect().unwrap();
        assert!(handle.turn_on(true));
        assert!(handle.turn_off(true));
    }

    #[test]
    fn ensure_off_confirms_when_already_off() {
        let mut handle = DeviceHandle::new(Box::new(NullDriver::new(info("d1"))));
        handle.connect().unwrap();
        assert!(handle.ensure_off());
    }

    #[test]
    fn retries_on_transient_send_failure_then_succeeds() {
        let mut mock = MockDeviceDriver::new();
        mock.expect_get_info().returning(|| info("d2"));
        let mut call = 0;
        mock.expect_send_on().times(3).returning(move || {
            call += 1;
            if call < 3 {
                Err(CoreError::DeviceUnreachable { device_id: "d2".into(), message: "timeout".into() })
            } else {
                Ok(())
            }
        });
        mock.expect_is_device_on().returning(|| Ok(true));
        let mut handle = DeviceHandle::new(Box::new(mock));
        assert!(handle.turn_on(true));
    }

    #[test]
    fn gives_up_after_retry_budget_exhausted() {
        let mut mock = MockDeviceDriver::new();
        mock.expect_get_info().returning(|| info("d3"));
        mock.expect_send_on().times(3).returning(|| {
            Err(CoreError::DeviceUnreachable { device_id: "d3".into(), message: "down".into() })
        });
        let mut handle = DeviceHandle::new(Box::new(mock));
        assert!(!handle.turn_on(true));
    }

    #[test]
    fn verify_mismatch_is_treated_as_failure_and_retried() {
        let mut mock = MockDeviceDriver::new();
        mock.expect_get_info().returning(|| info("d4"));
        mock.expect_send_on().times(3).returning(|| Ok(()));
        mock.expect_is_device_on().times(3).returning(|| Ok(false));
        let mut handle = DeviceHandle::new(Box::new(mock));
        assert!(!handle.turn_on(true));
    }

    #[test]
    fn registry_ensure_all_off() {
        let mut registry = DeviceRegistry::new();
        let mut handle = DeviceHandle::new(Box::new(NullDriver::new(info("d5"))));
        handle.connect().unwrap();
        handle.turn_on(true);
        registry.register("d5", handle);
        registry.ensure_all_off();
        assert!(registry.get_mut("d5").unwrap().ensure_off());
    }
}
