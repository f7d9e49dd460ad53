use async_trait::async_trait;

use crate::domain::errors::Result;
use crate::domain::value_objects::{SourceId, SourceKind, SourceLocator};

/// Port for the persistent id -> locator mapping
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    /// Insert a new entry. Fails with `Duplicate` if the id is taken; the
    /// existence check and the insert are one atomic step.
    async fn add(&self, kind: SourceKind, id: SourceId, locator: SourceLocator) -> Result<()>;

    /// Fails with `NotFound` for unknown ids
    async fn locate(&self, kind: SourceKind, id: SourceId) -> Result<SourceLocator>;

    /// Fails with `NotFound` for unknown ids, mutating nothing
    async fn remove(&self, kind: SourceKind, id: SourceId) -> Result<()>;

    /// Number of registered entries of one kind
    async fn count(&self, kind: SourceKind) -> Result<u64>;
}
