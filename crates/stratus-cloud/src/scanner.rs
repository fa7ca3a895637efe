use crate::endpoint::ProviderTable;
use crate::harvest::Harvester;
use crate::http::MetadataClient;
use crate::probe::Prober;
use crate::{CloudSettings, MetadataSnapshot, ProviderKind};
use std::sync::Arc;

/// One full collection cycle: detect the provider, then harvest it.
pub struct MetadataScanner {
    prober: Prober,
    harvester: Harvester,
}

impl MetadataScanner {
    pub fn new(
        client: Arc<dyn MetadataClient>,
        table: Arc<ProviderTable>,
        settings: &CloudSettings,
    ) -> Self {
        Self {
            prober: Prober::new(Arc::clone(&client), Arc::clone(&table), settings.probe_timeout),
            harvester: Harvester::new(client, table, settings.harvest_timeout),
        }
    }

    /// Returns a fresh snapshot, empty when no provider answered.
    pub async fn scan(&self) -> MetadataSnapshot {
        match self.prober.detect().await {
            ProviderKind::None => MetadataSnapshot::empty(),
            provider => self.harvester.harvest(provider).await,
        }
    }
}
