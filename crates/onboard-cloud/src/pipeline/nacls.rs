//! Default network ACL lockdown, every region

use super::Sequencer;
use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::error::Result;
use crate::nacl::{NaclEntrySpec, derive_rules, reconcile_default_nacls};
use crate::regions::for_each_region;

#[derive(Debug, Clone)]
pub struct NaclSettings {
    pub entries: Vec<NaclEntrySpec>,
}

pub async fn run(seq: &Sequencer<'_>, settings: &NaclSettings) -> Result<()> {
    let session = seq.session();
    let provider = session.provider();

    // Rejected before any region is touched
    let desired = seq.check(
        ResourceDescriptor::global(ResourceKind::NaclEntrySet, "default"),
        derive_rules(&settings.entries),
    )?;
    let desired = desired.as_slice();

    let regions = seq.regions().await?;
    for_each_region(regions, |region| async move {
        seq.step(
            ResourceDescriptor::regional(ResourceKind::NaclEntrySet, &region, "default"),
            reconcile_default_nacls(provider.ec2(&region).as_ref(), &region, desired),
        )
        .await?;
        Ok(())
    })
    .await
}
