use std::net::IpAddr;

use async_trait::async_trait;

use bfguard_core::AppResult;
use bfguard_domain::{ReservationError, ReservedList, ReservedSubnet};

/// Registry port for the allow-list and deny-list.
///
/// `add` and `remove` must observe a consistent view of both lists for the
/// duration of the conflict check and the mutation.
#[async_trait]
pub trait SubnetRegistry: Send + Sync {
    /// Returns whether any subnet of `list` contains the address.
    async fn contains(&self, list: ReservedList, address: IpAddr) -> AppResult<bool>;

    /// Appends a subnet to `list`.
    ///
    /// Fails when the subnet is already in `list` or intersects any subnet of
    /// the opposite list.
    async fn add(&self, list: ReservedList, subnet: ReservedSubnet) -> Result<(), ReservationError>;

    /// Removes a subnet from `list`.
    async fn remove(
        &self,
        list: ReservedList,
        subnet: ReservedSubnet,
    ) -> Result<(), ReservationError>;

    /// Returns a point-in-time copy of `list`.
    async fn snapshot(&self, list: ReservedList) -> AppResult<Vec<ReservedSubnet>>;
}
