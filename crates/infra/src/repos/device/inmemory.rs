use super::IDeviceRepo;
use crate::repos::shared::inmemory_repo::*;
use tempo_domain::Device;

pub struct InMemoryDeviceRepo {
    devices: std::sync::Mutex<Vec<Device>>,
}

impl InMemoryDeviceRepo {
    pub fn new() -> Self {
        Self {
            devices: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IDeviceRepo for InMemoryDeviceRepo {
    async fn insert(&self, device: &Device) -> anyhow::Result<()> {
        insert(device, &self.devices);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Option<Device> {
        find_by(&self.devices, |d| d.token == token)
            .into_iter()
            .next()
    }
}
