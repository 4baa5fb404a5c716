use async_trait::async_trait;
use locamap_core::StoreError;

use crate::location::Location;

/// The hosted `locations` table.
///
/// Implementations report failures as `StoreError::RemoteRead` or
/// `StoreError::RemoteWrite`; callers check the error before trusting data.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every row, in the order the service returns them
    async fn select_all(&self) -> Result<Vec<Location>, StoreError>;

    /// Rows whose `province` equals `province`
    async fn select_by_province(&self, province: &str) -> Result<Vec<Location>, StoreError>;

    /// Delete the row with this id
    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError>;
}
