//! Region fan-out driver

use crate::context::RegionSet;
use crate::error::Result;
use std::future::Future;
use tracing::Instrument;

/// Run `work` once per region, sequentially, in provider order.
///
/// The first error stops the fan-out; remaining regions are not visited.
pub async fn for_each_region<F, Fut>(regions: &RegionSet, mut work: F) -> Result<()>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    for (index, region) in regions.iter().enumerate() {
        tracing::debug!("Region {}/{}: {}", index + 1, regions.len(), region);
        let span = tracing::info_span!("region", region = %region);
        if let Err(e) = work(region.to_string()).instrument(span).await {
            tracing::error!("Aborting region fan-out in {}: {}", region, e);
            return Err(e);
        }
    }
    Ok(())
}
