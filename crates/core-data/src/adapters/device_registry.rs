//! Static device registry.
//!
//! A `DeviceResolver` over a fixed list of devices. The node binary seeds it
//! from configuration; tests toggle availability to exercise the
//! "registry unreachable" path.

use crate::error::ResolverError;
use crate::ports::outbound::{DeviceRef, DeviceResolver};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::DeviceInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

pub struct StaticDeviceResolver {
    devices: RwLock<Vec<DeviceInfo>>,
    available: AtomicBool,
}

impl StaticDeviceResolver {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Builder form of `register`.
    #[must_use]
    pub fn with_device(self, device: DeviceInfo) -> Self {
        self.register(device);
        self
    }

    /// Add or replace a device (matched by name).
    pub fn register(&self, device: DeviceInfo) {
        let mut devices = self.devices.write();
        devices.retain(|d| d.name != device.name);
        devices.push(device);
    }

    /// Simulate the registry going away or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }
}

impl Default for StaticDeviceResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceResolver for StaticDeviceResolver {
    async fn device(&self, reference: &DeviceRef) -> Result<DeviceInfo, ResolverError> {
        if !self.available.load(Ordering::Acquire) {
            return Err(ResolverError::Unavailable {
                reason: "device registry offline".to_string(),
            });
        }

        let devices = self.devices.read();
        let found = match reference {
            DeviceRef::Name(name) => devices.iter().find(|d| &d.name == name),
            DeviceRef::Id(id) => devices.iter().find(|d| &d.id == id),
        };

        match found {
            Some(device) => Ok(device.clone()),
            None => {
                debug!(device = %reference, "Device not registered");
                Err(ResolverError::NotFound {
                    reference: reference.key().to_string(),
                })
            }
        }
    }
}
