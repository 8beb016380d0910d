//! Scene descriptor consumed by every pane.
//!
//! A `SceneConfig` names the assets each backend should display and an
//! optional initial camera. Asset references and endpoints are opaque
//! strings handed to the loaders and transports; this module only parses
//! the descriptor and answers existence questions.

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::pose::CameraPose;

/// Mesh asset (glTF / GLB reference)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSource {
    pub gltf: Option<String>,
}

/// Tiled point-cloud source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotreeSource {
    pub url: String,
}

/// Point-cloud asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloudSource {
    pub ply: Option<String>,
    pub potree: Option<PotreeSource>,
}

/// Gaussian-splat asset (3DGS-format PLY)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplatSource {
    pub ply: Option<String>,
}

/// Server-side NeRF renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NerfSource {
    /// Base URL of the render server, e.g. `http://localhost:7007`
    pub server_url: Option<String>,
    pub stream: Option<bool>,
}

/// Pinhole intrinsics of the capture camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

/// Scene descriptor, immutable once attached to the panes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    pub name: String,
    #[serde(default)]
    pub mesh: Option<MeshSource>,
    #[serde(default)]
    pub point_cloud: Option<PointCloudSource>,
    #[serde(default)]
    pub splats: Option<SplatSource>,
    #[serde(default)]
    pub nerf: Option<NerfSource>,
    #[serde(default)]
    pub intrinsics: Option<Intrinsics>,
    #[serde(default)]
    pub initial_camera: Option<CameraPose>,
}

impl SceneConfig {
    /// Create an empty scene with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_mesh(mut self, gltf: impl Into<String>) -> Self {
        self.mesh = Some(MeshSource { gltf: Some(gltf.into()) });
        self
    }

    pub fn with_point_cloud(mut self, ply: impl Into<String>) -> Self {
        self.point_cloud = Some(PointCloudSource { ply: Some(ply.into()), potree: None });
        self
    }

    pub fn with_splats(mut self, ply: impl Into<String>) -> Self {
        self.splats = Some(SplatSource { ply: Some(ply.into()) });
        self
    }

    pub fn with_remote(mut self, server_url: impl Into<String>) -> Self {
        self.nerf = Some(NerfSource { server_url: Some(server_url.into()), stream: None });
        self
    }

    pub fn with_initial_camera(mut self, pose: CameraPose) -> Self {
        self.initial_camera = Some(pose);
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a descriptor from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn mesh_asset(&self) -> Option<&str> {
        self.mesh.as_ref()?.gltf.as_deref().filter(|s| !s.is_empty())
    }

    pub fn point_cloud_asset(&self) -> Option<&str> {
        self.point_cloud.as_ref()?.ply.as_deref().filter(|s| !s.is_empty())
    }

    pub fn splat_asset(&self) -> Option<&str> {
        self.splats.as_ref()?.ply.as_deref().filter(|s| !s.is_empty())
    }

    /// Render server base URL without a trailing slash
    pub fn remote_endpoint(&self) -> Option<&str> {
        self.nerf
            .as_ref()?
            .server_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
#[path = "scene_config_tests.rs"]
mod tests;
