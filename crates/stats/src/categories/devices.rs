use crate::calculator::{Calculator, Category, repository};
use crate::error::{ErrorKind, Result};
use ember_idb::Device;
use ember_source::Bundle;
use exn::ResultExt;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStatistics {
    pub device_count: usize,
    pub enabled_count: usize,
    pub devices: Vec<Device>,
}

pub struct Devices;

impl Calculator for Devices {
    const CATEGORY: Category = Category::Devices;
    type Output = DeviceStatistics;

    async fn calculate(&self, bundle: &Bundle) -> Result<Option<DeviceStatistics>> {
        let Some(repo) = repository(bundle).await? else {
            return Ok(None);
        };
        let devices = repo.devices().await.or_raise(|| ErrorKind::Query("devices"))?;
        Ok(devices.map(|devices| DeviceStatistics {
            device_count: devices.len(),
            enabled_count: devices.iter().filter(|d| d.enabled).count(),
            devices,
        }))
    }
}
