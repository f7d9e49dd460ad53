use std::sync::Arc;

use crate::domain::errors::Result;
use crate::domain::ports::SourceRegistry;
use crate::domain::value_objects::{SourceId, SourceKind, SourceLocator};

/// Application service for registry CRUD
pub struct RegistryService {
    registry: Arc<dyn SourceRegistry>,
}

impl RegistryService {
    pub fn new(registry: Arc<dyn SourceRegistry>) -> Self {
        Self { registry }
    }

    /// Register a new source (use case)
    pub async fn add_source(&self, kind: SourceKind, id: i64, locator: String) -> Result<()> {
        let id = SourceId::new(id)?;
        let locator = SourceLocator::new(locator)?;

        self.registry.add(kind, id, locator).await?;
        tracing::info!(kind = %kind, id = %id, "Source registered");
        Ok(())
    }

    /// Remove a registered source (use case)
    pub async fn remove_source(&self, kind: SourceKind, id: SourceId) -> Result<()> {
        self.registry.remove(kind, id).await?;
        tracing::info!(kind = %kind, id = %id, "Source removed");
        Ok(())
    }

    pub async fn locate(&self, kind: SourceKind, id: SourceId) -> Result<SourceLocator> {
        self.registry.locate(kind, id).await
    }
}
