use serde::{Deserialize, Serialize};

/// Built-in firmware publication origin. Overridable per session for
/// staging mirrors and on-prem deployments.
pub const DEFAULT_BASE_URL: &str = "https://ota.geckota.dev";

/// Default release channel.
pub const DEFAULT_CHANNEL: &str = "prod";

/// Direction in which the images of an update plan are applied.
///
/// The plan orders an apploader prerequisite before its application
/// image. The deployed fleet is driven last-to-first, so the
/// application image is flashed first and the device picks up the
/// apploader on the following pass; devices verified to expect
/// apploader-first take `PlanOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOrder {
    /// Apply plan index 0 first.
    PlanOrder,
    /// Apply the last plan index first.
    ReversePlanOrder,
}

/// Engine configuration, passed at session construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Origin the index and artifacts are published under. Must include
    /// the scheme.
    pub base_url: String,

    /// Release channel segment of the index path. An empty string selects
    /// the legacy layout without a channel segment.
    pub channel: String,

    /// Iteration direction over the update plan.
    pub apply_order: ApplyOrder,

    /// Verify each downloaded artifact against the MD5 the index
    /// advertises. Off by default: the fleet never verified, and the
    /// digest is informational.
    pub verify_md5: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            apply_order: ApplyOrder::ReversePlanOrder,
            verify_md5: false,
        }
    }
}

impl EngineConfig {
    /// Resolve the index URL for a client:
    /// `{base_url}/{client}/{channel}/index.json`, with the channel
    /// segment omitted when the channel is empty.
    pub fn index_url(&self, client: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.channel.is_empty() {
            format!("{}/{}/index.json", base, client)
        } else {
            format!("{}/{}/{}/index.json", base, client, self.channel)
        }
    }
}
