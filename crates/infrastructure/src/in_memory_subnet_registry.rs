use std::net::IpAddr;

use async_trait::async_trait;
use bfguard_application::SubnetRegistry;
use bfguard_core::AppResult;
use bfguard_domain::{AccessLists, ReservationError, ReservedList, ReservedSubnet};
use tokio::sync::RwLock;

/// In-memory subnet registry guarding both lists with one lock.
#[derive(Default)]
pub struct InMemorySubnetRegistry {
    lists: RwLock<AccessLists>,
}

impl InMemorySubnetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubnetRegistry for InMemorySubnetRegistry {
    async fn contains(&self, list: ReservedList, address: IpAddr) -> AppResult<bool> {
        Ok(self.lists.read().await.contains(list, address))
    }

    async fn add(&self, list: ReservedList, subnet: ReservedSubnet) -> Result<(), ReservationError> {
        self.lists.write().await.add(list, subnet)
    }

    async fn remove(
        &self,
        list: ReservedList,
        subnet: ReservedSubnet,
    ) -> Result<(), ReservationError> {
        self.lists.write().await.remove(list, subnet)
    }

    async fn snapshot(&self, list: ReservedList) -> AppResult<Vec<ReservedSubnet>> {
        Ok(self.lists.read().await.entries(list).to_vec())
    }
}
