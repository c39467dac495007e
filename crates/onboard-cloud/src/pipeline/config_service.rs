//! Config recording service: one bucket, then per-region topic, role,
//! recorder and delivery channel

use super::Sequencer;
use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::error::{CloudError, Result};
use crate::outcome::Outcome;
use crate::provider::{
    ConfigServiceApi, DeliveryChannelSpec, DeliveryChannelStatus, RecorderSpec, RecorderStatus,
};
use crate::reconcile::{RoleSpec, reconcile_bucket, reconcile_role, reconcile_topic};
use crate::regions::for_each_region;
use crate::waiter::settle;
use std::sync::Arc;

pub const RECORDER_NAME: &str = "default";
pub const CHANNEL_NAME: &str = "default";
pub const CONFIG_MANAGED_POLICY: &str = "arn:aws:iam::aws:policy/service-role/AWSConfigRole";
pub const CONFIG_INLINE_POLICY: &str = "config-policy";
pub const DELIVERY_FREQUENCY: &str = "One_Hour";

const LAST_STATUS_SUCCESS: &str = "SUCCESS";

/// Policy document that depends on the region it is rendered for
pub trait RegionalPolicy: Send + Sync {
    fn render(&self, region: &str) -> Result<String>;
}

impl<F> RegionalPolicy for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn render(&self, region: &str) -> Result<String> {
        self(region)
    }
}

pub struct ConfigServiceSettings {
    /// Fully qualified bucket name, created in the home region
    pub bucket_name: String,
    pub topic_name: String,
    /// Per-region role is `<role_name_prefix>-<region>`
    pub role_name_prefix: String,
    pub assume_role_policy: String,
    pub role_policy: Arc<dyn RegionalPolicy>,
}

impl ConfigServiceSettings {
    pub fn role_name(&self, region: &str) -> String {
        format!("{}-{}", self.role_name_prefix, region)
    }
}

/// Readiness gate: the region is left alone only when the default recorder
/// is recording with a successful last run and the default channel's last
/// delivery succeeded.
pub fn is_recording(recorders: &[RecorderStatus], channels: &[DeliveryChannelStatus]) -> bool {
    let recorder_ok = recorders.iter().any(|r| {
        r.name == RECORDER_NAME
            && r.recording
            && r.last_status.as_deref() == Some(LAST_STATUS_SUCCESS)
    });
    let channel_ok = channels.iter().any(|c| {
        c.name == CHANNEL_NAME && c.last_status.as_deref() == Some(LAST_STATUS_SUCCESS)
    });
    recorder_ok && channel_ok
}

async fn recording_state(
    config: &dyn ConfigServiceApi,
) -> Result<(Vec<RecorderStatus>, Vec<DeliveryChannelStatus>)> {
    let recorders = config.recorder_statuses().await?;
    let channels = config.delivery_channel_statuses().await?;
    Ok((recorders, channels))
}

pub async fn run(seq: &Sequencer<'_>, settings: &ConfigServiceSettings) -> Result<()> {
    let session = seq.session();
    let ctx = session.context();
    let provider = session.provider();

    seq.step(
        ResourceDescriptor::global(ResourceKind::Bucket, &settings.bucket_name),
        reconcile_bucket(
            provider.s3().as_ref(),
            &settings.bucket_name,
            &ctx.home_region,
        ),
    )
    .await?;

    let regions = seq.regions().await?;
    for_each_region(regions, |region| async move {
        let config = provider.config_service(&region);
        let recorder =
            ResourceDescriptor::regional(ResourceKind::Recorder, &region, RECORDER_NAME);

        let (recorders, channels) =
            seq.check(recorder.clone(), recording_state(config.as_ref()).await)?;
        if is_recording(&recorders, &channels) {
            tracing::info!("Config service already recording in {}", region);
            seq.record(recorder, Outcome::AlreadySatisfied);
            return Ok(());
        }

        tracing::info!("Setting up config service in {}", region);
        let topic_arn = ctx.topic_arn(&region, &settings.topic_name);
        seq.step(
            ResourceDescriptor::regional(ResourceKind::Topic, &region, &topic_arn),
            reconcile_topic(
                provider.sns(&region).as_ref(),
                &region,
                &topic_arn,
                &settings.topic_name,
            ),
        )
        .await?;

        let role_name = settings.role_name(&region);
        let role_policy = seq.check(
            ResourceDescriptor::regional(ResourceKind::Role, &region, &role_name),
            settings.role_policy.render(&region),
        )?;
        let role = RoleSpec::new(&role_name, &settings.assume_role_policy)
            .with_managed_policy(CONFIG_MANAGED_POLICY)
            .with_inline_policy(CONFIG_INLINE_POLICY, role_policy);
        let iam = provider.iam();
        let role_outcome = seq
            .step(
                role.descriptor(),
                reconcile_role(iam.as_ref(), &role, session.wait()),
            )
            .await?;
        if role_outcome.changed() {
            settle(&format!("role {}", role_name), session.wait().propagation_delay).await;
        }

        let had_recorder = recorders.iter().any(|r| r.name == RECORDER_NAME);
        seq.step(recorder, async {
            config
                .put_recorder(&RecorderSpec {
                    name: RECORDER_NAME.to_string(),
                    role_arn: ctx.role_arn(&role_name),
                    all_supported: true,
                    include_global_resource_types: true,
                })
                .await?;
            Ok::<_, CloudError>(if had_recorder {
                Outcome::Repaired
            } else {
                Outcome::Created
            })
        })
        .await?;

        let had_channel = channels.iter().any(|c| c.name == CHANNEL_NAME);
        seq.step(
            ResourceDescriptor::regional(ResourceKind::Channel, &region, CHANNEL_NAME),
            async {
                config
                    .put_delivery_channel(&DeliveryChannelSpec {
                        name: CHANNEL_NAME.to_string(),
                        s3_bucket_name: settings.bucket_name.clone(),
                        sns_topic_arn: topic_arn.clone(),
                        delivery_frequency: DELIVERY_FREQUENCY.to_string(),
                    })
                    .await?;
                Ok::<_, CloudError>(if had_channel {
                    Outcome::Repaired
                } else {
                    Outcome::Created
                })
            },
        )
        .await?;

        seq.step(
            ResourceDescriptor::regional(
                ResourceKind::Recorder,
                &region,
                format!("{} (recording)", RECORDER_NAME),
            ),
            async {
                config.start_recorder(RECORDER_NAME).await?;
                Ok::<_, CloudError>(Outcome::Repaired)
            },
        )
        .await?;

        tracing::info!("Config service recording in {}", region);
        Ok(())
    })
    .await
}
