use std::sync::Arc;

use geckota_core::{EngineConfig, UpdateError};
use geckota_fetch::Fetcher;
use tracing::{debug, info};

use crate::model::{DeviceFirmware, FirmwareIndex, FirmwareInfo, UpdatePlan};

/// C1 — locate and interpret the remote firmware index.
///
/// The index lives at `{base_url}/{client}/{channel}/index.json` and maps
/// model tokens to published versions. `resolve` turns it into an
/// [`UpdatePlan`] for one device.
pub struct Resolver {
    config: EngineConfig,
    fetcher: Arc<dyn Fetcher>,
}

impl Resolver {
    pub fn new(config: EngineConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Fetch the index and select the artifacts `model` should apply.
    ///
    /// Returns the empty plan when `current_version` already equals the
    /// selected latest. When the target declares an apploader
    /// prerequisite, the prerequisite is prepended, so application order
    /// is plan order.
    pub async fn resolve(
        &self,
        client: &str,
        model: &str,
        current_version: Option<&str>,
    ) -> Result<UpdatePlan, UpdateError> {
        let url = self.config.index_url(client);
        debug!("fetching firmware index from {url}");

        let body = self
            .fetcher
            .get_text(&url)
            .await
            .map_err(|e| UpdateError::IndexUnavailable(e.to_string()))?;

        let index: FirmwareIndex = serde_json::from_str(&body)
            .map_err(|e| UpdateError::IndexMalformed(format!("index parse failed: {e}")))?;

        let device = index.get(model).ok_or_else(|| {
            UpdateError::DeviceUnknown(format!("model '{model}' not in index"))
        })?;

        let latest = Self::select_latest(device, model)?;

        if current_version == Some(latest) {
            info!("model {model} already on {latest}, no update required");
            return Ok(UpdatePlan::empty());
        }

        let target = Self::lookup(device, latest)?;
        let mut images = Vec::with_capacity(2);

        if let Some(prereq_key) = target.apploader.as_deref() {
            let prereq = Self::lookup(device, prereq_key)?;
            debug!("apploader prerequisite {prereq_key} for {latest}");
            images.push(prereq);
        }
        images.push(target);

        info!(
            "model {model}: {} -> {latest}, {} image(s)",
            current_version.unwrap_or("unknown"),
            images.len()
        );
        Ok(UpdatePlan::new(images))
    }

    /// Determine the latest version key. Uses the `latest` field when
    /// present; tolerates its absence only for single-version entries.
    /// Version strings are never ordered.
    fn select_latest<'a>(
        device: &'a DeviceFirmware,
        model: &str,
    ) -> Result<&'a str, UpdateError> {
        if let Some(latest) = device.latest.as_deref() {
            return Ok(latest);
        }
        if device.versions.len() == 1 {
            if let Some(only) = device.versions.keys().next() {
                return Ok(only);
            }
        }
        Err(UpdateError::LatestUnknown(format!(
            "model '{model}' has {} versions and no 'latest' entry",
            device.versions.len()
        )))
    }

    /// Materialise the artifact stored under `key`, stamping the version.
    fn lookup(device: &DeviceFirmware, key: &str) -> Result<FirmwareInfo, UpdateError> {
        let mut info = device
            .versions
            .get(key)
            .cloned()
            .ok_or_else(|| {
                UpdateError::IndexMalformed(format!("version '{key}' referenced but not present"))
            })?;
        info.version = key.to_string();
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockFetcher;
    use geckota_core::error_code;

    const INDEX_URL: &str = "https://fw.test/acme/prod/index.json";

    fn config() -> EngineConfig {
        EngineConfig {
            base_url: "https://fw.test".into(),
            ..Default::default()
        }
    }

    fn resolver_with(body: &str) -> Resolver {
        let fetcher = MockFetcher::new();
        fetcher.put_text(INDEX_URL, body);
        Resolver::new(config(), fetcher)
    }

    const TWO_VERSIONS: &str = r#"{
        "model_a": {
            "latest": "v2",
            "v1": {"name":"app","url":"https://cdn/u1.gbl","md5":"m1"},
            "v2": {"name":"app","url":"https://cdn/u2.gbl","md5":"m2"}
        }
    }"#;

    #[tokio::test]
    async fn selects_latest_when_outdated() {
        let resolver = resolver_with(TWO_VERSIONS);
        let plan = resolver.resolve("acme", "model_a", Some("v1")).await.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.images()[0].version, "v2");
        assert_eq!(plan.images()[0].url, "https://cdn/u2.gbl");
    }

    #[tokio::test]
    async fn empty_plan_when_current() {
        let resolver = resolver_with(TWO_VERSIONS);
        let plan = resolver.resolve("acme", "model_a", Some("v2")).await.unwrap();
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn resolve_is_deterministic() {
        let resolver = resolver_with(TWO_VERSIONS);
        let a = resolver.resolve("acme", "model_a", Some("v1")).await.unwrap();
        let b = resolver.resolve("acme", "model_a", Some("v1")).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn apploader_is_prepended() {
        let resolver = resolver_with(
            r#"{
            "model_a": {
                "latest": "v2",
                "a1": {"name":"apploader","url":"https://cdn/a1.gbl","md5":"ma"},
                "v2": {"name":"app","url":"https://cdn/u2.gbl","md5":"m2","apploader":"a1"}
            }
        }"#,
        );
        let plan = resolver.resolve("acme", "model_a", None).await.unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.images()[0].version, "a1");
        assert_eq!(plan.images()[0].name, "apploader");
        assert_eq!(plan.images()[1].version, "v2");
        assert_eq!(plan.images()[1].apploader.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn unknown_model_fails() {
        let resolver = resolver_with(TWO_VERSIONS);
        let err = resolver.resolve("acme", "model_x", None).await.unwrap_err();
        assert_eq!(err.code(), error_code::DEVICE_UNKNOWN);
    }

    #[tokio::test]
    async fn missing_latest_with_two_versions_fails() {
        let resolver = resolver_with(
            r#"{
            "model_a": {
                "v1": {"name":"app","url":"u1","md5":"m1"},
                "v2": {"name":"app","url":"u2","md5":"m2"}
            }
        }"#,
        );
        let err = resolver.resolve("acme", "model_a", None).await.unwrap_err();
        assert_eq!(err.code(), error_code::LATEST_UNKNOWN);
    }

    #[tokio::test]
    async fn missing_latest_with_single_version_is_tolerated() {
        let resolver = resolver_with(
            r#"{"model_a": {"v1": {"name":"app","url":"u1","md5":"m1"}}}"#,
        );
        let plan = resolver.resolve("acme", "model_a", None).await.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.images()[0].version, "v1");
    }

    #[tokio::test]
    async fn latest_never_inferred_from_key_order() {
        // Same entries, swapped key order: `latest` still decides.
        let swapped = r#"{
            "model_a": {
                "v2": {"name":"app","url":"https://cdn/u2.gbl","md5":"m2"},
                "v1": {"name":"app","url":"https://cdn/u1.gbl","md5":"m1"},
                "latest": "v1"
            }
        }"#;
        let resolver = resolver_with(swapped);
        let plan = resolver.resolve("acme", "model_a", None).await.unwrap();
        assert_eq!(plan.images()[0].version, "v1");
    }

    #[tokio::test]
    async fn transport_failure_is_index_unavailable() {
        let fetcher = MockFetcher::new();
        fetcher.put_status(INDEX_URL, 503);
        let resolver = Resolver::new(config(), fetcher);
        let err = resolver.resolve("acme", "model_a", None).await.unwrap_err();
        assert_eq!(err.code(), error_code::INDEX_UNAVAILABLE);
    }

    #[tokio::test]
    async fn bad_json_is_index_malformed() {
        let resolver = resolver_with("not json at all");
        let err = resolver.resolve("acme", "model_a", None).await.unwrap_err();
        assert_eq!(err.code(), error_code::INDEX_MALFORMED);
    }

    #[tokio::test]
    async fn dangling_latest_is_index_malformed() {
        let resolver = resolver_with(
            r#"{"model_a": {"latest": "v9", "v1": {"name":"a","url":"u","md5":"m"}}}"#,
        );
        let err = resolver.resolve("acme", "model_a", None).await.unwrap_err();
        assert_eq!(err.code(), error_code::INDEX_MALFORMED);
    }
}
