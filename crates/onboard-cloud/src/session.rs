//! Per-process session: provider handle, account context, waiter settings

use crate::context::{AccountContext, RegionSet};
use crate::error::{CloudError, Result};
use crate::provider::{CloudProvider, WaitConfig};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Everything a run shares read-only.
///
/// The region set is fetched from the provider on first use and reused for
/// every region-scoped pipeline of the process.
pub struct Session {
    provider: Arc<dyn CloudProvider>,
    context: AccountContext,
    wait: WaitConfig,
    regions: OnceCell<RegionSet>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn CloudProvider>,
        context: AccountContext,
        wait: WaitConfig,
    ) -> Self {
        Self {
            provider,
            context,
            wait,
            regions: OnceCell::new(),
        }
    }

    pub fn provider(&self) -> &dyn CloudProvider {
        self.provider.as_ref()
    }

    pub fn context(&self) -> &AccountContext {
        &self.context
    }

    pub fn wait(&self) -> &WaitConfig {
        &self.wait
    }

    /// Enabled regions, fetched once per session
    pub async fn regions(&self) -> Result<&RegionSet> {
        self.regions
            .get_or_try_init(|| async {
                let ec2 = self.provider.ec2(&self.context.home_region);
                let regions: RegionSet = ec2.describe_regions().await?.into_iter().collect();
                tracing::info!("Discovered {} regions", regions.len());
                Ok::<_, CloudError>(regions)
            })
            .await
    }
}
