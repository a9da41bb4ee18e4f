//! Caller-facing entry points, mirroring the surface the mobile
//! clients expose: latest-info lookup, single-artifact download, and
//! the full DFU drive.

use std::path::PathBuf;
use std::sync::Arc;

use geckota_ble::BleClient;
use geckota_core::{EngineConfig, Outcome, ProgressFn, StatusFn, UpdateError};
use geckota_fetch::Fetcher;

use crate::cache::ArtifactCache;
use crate::model::FirmwareInfo;
use crate::orchestrator::{Orchestrator, UpdateParams};
use crate::resolver::Resolver;

/// Everything `start_dfu` needs to know about the target and the index
/// location. `channel` and `base_url` fall back to the configured
/// defaults when `None`.
#[derive(Debug, Clone)]
pub struct DfuRequest {
    pub peripheral_id: String,
    pub client: String,
    pub model: String,
    pub channel: Option<String>,
    pub base_url: Option<String>,
    pub current_version: Option<String>,
    pub is_in_ota: bool,
}

fn config_for(channel: Option<&str>, base_url: Option<&str>) -> EngineConfig {
    let mut config = EngineConfig::default();
    if let Some(channel) = channel {
        config.channel = channel.to_string();
    }
    if let Some(base_url) = base_url {
        config.base_url = base_url.to_string();
    }
    config
}

/// Resolve the artifacts `model` should apply, in application order.
/// Empty when the device already runs the latest version.
pub async fn get_latest_fw_info(
    fetcher: Arc<dyn Fetcher>,
    client: &str,
    model: &str,
    current_version: Option<&str>,
    channel: Option<&str>,
    base_url: Option<&str>,
) -> Result<Vec<FirmwareInfo>, UpdateError> {
    let config = config_for(channel, base_url);
    let plan = Resolver::new(config, fetcher)
        .resolve(client, model, current_version)
        .await?;
    Ok(plan.into_images())
}

/// Download one artifact to local storage and return its path.
pub async fn download_fw(
    fetcher: Arc<dyn Fetcher>,
    info: &FirmwareInfo,
) -> Result<PathBuf, UpdateError> {
    let artifact = ArtifactCache::new(fetcher, false).download(info).await?;
    Ok(artifact.path)
}

/// Run a full update against one peripheral. Never fails with an error:
/// the outcome carries the caller-facing return code (1 / 0 / -1).
pub async fn start_dfu(
    request: DfuRequest,
    ble: Arc<dyn BleClient>,
    fetcher: Arc<dyn Fetcher>,
    on_progress: ProgressFn,
    on_status: StatusFn,
) -> Outcome {
    let config = config_for(request.channel.as_deref(), request.base_url.as_deref());
    let params = UpdateParams {
        peripheral_id: request.peripheral_id,
        client: request.client,
        model: request.model,
        current_version: request.current_version,
        is_in_ota: request.is_in_ota,
    };

    Orchestrator::new(config, fetcher, ble)
        .on_progress(on_progress)
        .on_status(on_status)
        .run(&params)
        .await
}
