use std::sync::Arc;

use geckota_ble::BleClient;
use geckota_core::{
    noop_progress, noop_status, ApplyOrder, EngineConfig, Outcome, ProgressFn, StatusFn,
    UpdateError,
};
use geckota_fetch::Fetcher;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cache::ArtifactCache;
use crate::model::DownloadedArtifact;
use crate::profile::REBOOT_DELAY;
use crate::resolver::Resolver;
use crate::session::OtaSession;

/// Target selection for one update run.
#[derive(Debug, Clone)]
pub struct UpdateParams {
    /// Platform identifier of the peripheral.
    pub peripheral_id: String,
    /// Client (publisher) segment of the index path.
    pub client: String,
    /// Model token to look up in the index.
    pub model: String,
    /// Version the device reports running, if known.
    pub current_version: Option<String>,
    /// The device is already in DFU mode; skip the reboot for the first
    /// image.
    pub is_in_ota: bool,
}

/// C4 — sequence resolver, cache and protocol engine over all images of
/// an update, classify the outcome, and keep the caller informed.
///
/// `run` never returns an error: every failure path collapses into
/// [`Outcome::Failure`] with a status message, matching the return-code
/// contract of the deployed clients.
pub struct Orchestrator {
    config: EngineConfig,
    fetcher: Arc<dyn Fetcher>,
    ble: Arc<dyn BleClient>,
    on_progress: ProgressFn,
    on_status: StatusFn,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(config: EngineConfig, fetcher: Arc<dyn Fetcher>, ble: Arc<dyn BleClient>) -> Self {
        Self {
            config,
            fetcher,
            ble,
            on_progress: noop_progress(),
            on_status: noop_status(),
            cancel: CancellationToken::new(),
        }
    }

    /// Install the progress callback (per-image ratio in `[0, 1]`).
    pub fn on_progress(mut self, f: ProgressFn) -> Self {
        self.on_progress = f;
        self
    }

    /// Install the status callback (opaque human-readable messages).
    pub fn on_status(mut self, f: StatusFn) -> Self {
        self.on_status = f;
        self
    }

    /// Token that cancels the run at the next cooperative point.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the update. Returns SUCCESS, FAILURE or NO_UPDATE.
    pub async fn run(&self, params: &UpdateParams) -> Outcome {
        match self.run_inner(params).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("update failed: {e} (code {})", e.code());
                self.status(&format!("update failed: {e}"));
                Outcome::Failure
            }
        }
    }

    async fn run_inner(&self, params: &UpdateParams) -> Result<Outcome, UpdateError> {
        self.status("checking for firmware updates");
        let resolver = Resolver::new(self.config.clone(), self.fetcher.clone());
        let plan = resolver
            .resolve(&params.client, &params.model, params.current_version.as_deref())
            .await?;

        if plan.is_empty() {
            (self.on_progress)(1.0);
            self.status("device firmware is up to date");
            return Ok(Outcome::NoUpdate);
        }

        let cache = ArtifactCache::new(self.fetcher.clone(), self.config.verify_md5);
        let mut artifacts = Vec::with_capacity(plan.len());
        for info in plan.images() {
            self.status(&format!("downloading {} {}", info.name, info.version));
            artifacts.push(cache.download(info).await?);
        }

        let order: Vec<usize> = match self.config.apply_order {
            ApplyOrder::PlanOrder => (0..artifacts.len()).collect(),
            ApplyOrder::ReversePlanOrder => (0..artifacts.len()).rev().collect(),
        };

        let total = order.len();
        let mut skip_reboot = params.is_in_ota;
        for (applied, &idx) in order.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(UpdateError::Cancelled);
            }

            let artifact = &artifacts[idx];
            self.status(&format!(
                "installing {} {} ({}/{total})",
                artifact.info.name,
                artifact.info.version,
                applied + 1
            ));
            self.apply_image(params, artifact, skip_reboot).await?;

            // The device re-enters DFU on its own between the parts of a
            // multi-part update.
            skip_reboot = true;

            if applied + 1 < total {
                self.status("waiting for device reboot");
                sleep(REBOOT_DELAY).await;
            }
        }

        self.status("firmware update complete");
        info!("applied {total} image(s) to {}", params.peripheral_id);
        Ok(Outcome::Success)
    }

    /// Flash one image, retrying exactly once after a cancel +
    /// reboot-delay cycle. Resolver and download errors never reach
    /// here; only protocol errors are retried.
    async fn apply_image(
        &self,
        params: &UpdateParams,
        artifact: &DownloadedArtifact,
        skip_reboot: bool,
    ) -> Result<(), UpdateError> {
        let image = tokio::fs::read(&artifact.path)
            .await
            .map_err(|e| UpdateError::Unknown(format!("read artifact: {e}")))?;

        match self.flash_once(params, artifact, &image, skip_reboot).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_retryable() => {
                warn!(
                    "image {} failed ({e}), retrying once",
                    artifact.info.version
                );
                self.status(&format!("retrying {} {}", artifact.info.name, artifact.info.version));
                let _ = self.ble.cancel_connection(&params.peripheral_id).await;
                sleep(REBOOT_DELAY).await;
                self.flash_once(params, artifact, &image, skip_reboot).await
            }
            Err(e) => Err(e),
        }
    }

    async fn flash_once(
        &self,
        params: &UpdateParams,
        artifact: &DownloadedArtifact,
        image: &[u8],
        skip_reboot: bool,
    ) -> Result<(), UpdateError> {
        // No stale connection may survive into a session.
        let _ = self.ble.cancel_connection(&params.peripheral_id).await;

        let mut session = OtaSession::new(
            self.ble.clone(),
            params.peripheral_id.clone(),
            self.cancel.child_token(),
            self.on_progress.clone(),
        );
        let written = session.flash(image, skip_reboot).await?;

        if written != artifact.size {
            return Err(UpdateError::WriteFailed(format!(
                "expected {} bytes, wrote {written}",
                artifact.size
            )));
        }
        Ok(())
    }

    fn status(&self, msg: &str) {
        info!("{msg}");
        (self.on_status)(msg);
    }
}
