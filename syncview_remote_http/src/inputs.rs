/// Training input listing and health probe of a render server.
///
/// `GET {server}/inputs` returns `{ "count": n, "cameras": [pose, …] }`;
/// the i-th input image is served at `{server}/inputs/image/{i}`.

use serde::Deserialize;
use syncview_core::syncview::{CameraPose, Error, Result};
use syncview_core::viewer_debug;

const LOG_SOURCE: &str = "syncview::RemoteInputs";

/// Input views a render server was trained on
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputsInfo {
    pub count: usize,
    #[serde(default)]
    pub cameras: Vec<CameraPose>,
}

impl InputsInfo {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::RemoteRequestFailed(format!("malformed inputs listing: {}", e)))
    }

    /// Camera of input `index`, when the server listed one
    pub fn camera(&self, index: usize) -> Option<&CameraPose> {
        self.cameras.get(index)
    }

    /// One-line caption, e.g. `#0 pos=(1.0,2.0,3.0) fov=60`
    pub fn caption(&self, index: usize) -> Option<String> {
        let camera = self.camera(index)?;
        let p = camera.position;
        Some(format!("#{} pos=({:.1},{:.1},{:.1}) fov={}", index, p.x, p.y, p.z, camera.fov))
    }
}

#[derive(Deserialize)]
struct Health {
    ok: bool,
}

fn base(server_url: &str) -> &str {
    server_url.trim_end_matches('/')
}

pub fn inputs_url(server_url: &str) -> String {
    format!("{}/inputs", base(server_url))
}

pub fn input_image_url(server_url: &str, index: usize) -> String {
    format!("{}/inputs/image/{}", base(server_url), index)
}

/// Blocking GET returning the body of a 2xx response
fn get_text(url: &str) -> Result<String> {
    let response = reqwest::blocking::get(url)
        .map_err(|e| Error::RemoteRequestFailed(format!("{}: {}", url, e)))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::RemoteRequestFailed(format!("{} returned {}", url, status)));
    }
    response
        .text()
        .map_err(|e| Error::RemoteRequestFailed(format!("failed to read response: {}", e)))
}

/// Fetch the training input listing of `server_url`
pub fn fetch_inputs(server_url: &str) -> Result<InputsInfo> {
    let url = inputs_url(server_url);
    viewer_debug!(LOG_SOURCE, "GET {}", url);
    InputsInfo::from_json_str(&get_text(&url)?)
}

/// Whether `server_url` answers its health endpoint with `{ "ok": true }`
pub fn check_health(server_url: &str) -> Result<bool> {
    let url = format!("{}/health", base(server_url));
    let health: Health = serde_json::from_str(&get_text(&url)?)
        .map_err(|e| Error::RemoteRequestFailed(format!("malformed health reply: {}", e)))?;
    Ok(health.ok)
}

#[cfg(test)]
#[path = "inputs_tests.rs"]
mod tests;
