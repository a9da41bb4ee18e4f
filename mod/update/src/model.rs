use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Index wire model
// ---------------------------------------------------------------------------

/// One downloadable firmware artifact, as published in the index.
///
/// `version` is not part of the wire object; it is the key the object
/// sits under, copied in by the resolver. Version strings
/// (`YYYYMMDD.<shorthash>`) compare by equality only; nothing in the
/// engine orders them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FirmwareInfo {
    /// Human label, e.g. "h106 application".
    pub name: String,

    /// Origin URL. Single-use; never cached beyond one run.
    pub url: String,

    /// Hex MD5 digest advertised by the index. Informational unless
    /// verification is enabled.
    pub md5: String,

    /// Version key of a prerequisite apploader artifact within the same
    /// model entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apploader: Option<String>,

    /// The version key this artifact was selected under.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// All published firmware versions of one device model.
///
/// On the wire this is a flat object: a distinguished `latest` key whose
/// value names one of the sibling keys, plus one entry per version.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceFirmware {
    /// Version key of the current release. Historically omitted for
    /// single-version entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,

    /// Version key → artifact.
    #[serde(flatten)]
    pub versions: BTreeMap<String, FirmwareInfo>,
}

/// The full index: model token → published firmware.
pub type FirmwareIndex = BTreeMap<String, DeviceFirmware>;

// ---------------------------------------------------------------------------
// UpdatePlan
// ---------------------------------------------------------------------------

/// The resolver's output: an ordered sequence of artifacts to apply.
///
/// When the target declares an apploader prerequisite, the prerequisite
/// sits at index 0 and the application image last. Immutable once
/// produced; the orchestrator never reorders it.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    images: Vec<FirmwareInfo>,
}

impl UpdatePlan {
    pub fn new(images: Vec<FirmwareInfo>) -> Self {
        Self { images }
    }

    /// The empty plan: device already runs the latest version.
    pub fn empty() -> Self {
        Self { images: Vec::new() }
    }

    pub fn images(&self) -> &[FirmwareInfo] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn into_images(self) -> Vec<FirmwareInfo> {
        self.images
    }
}

// ---------------------------------------------------------------------------
// DownloadedArtifact
// ---------------------------------------------------------------------------

/// An artifact materialised on local storage.
///
/// The path stays valid for the lifetime of the update session;
/// deleting the temp file afterwards is the caller's responsibility.
#[derive(Debug, Clone)]
pub struct DownloadedArtifact {
    pub info: FirmwareInfo,
    pub path: PathBuf,
    pub size: u64,
}
