/*!
# SyncView Remote HTTP

HTTP plumbing for server-rendered panes.

- [`HttpFrameTransport`]: a [`FrameTransport`](syncview_core::syncview::collaborators::FrameTransport)
  that fetches `{server}/render?…` frames on a worker thread, so the
  viewer's frame loop never blocks on the network
- [`fetch_inputs`] / [`input_image_url`]: the render server's listing of
  training input views
- [`check_health`]: liveness probe of the render server
*/

mod http_transport;
mod inputs;

pub use http_transport::HttpFrameTransport;
pub use inputs::{check_health, fetch_inputs, input_image_url, inputs_url, InputsInfo};
