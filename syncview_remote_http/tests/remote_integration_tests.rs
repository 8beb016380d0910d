//! Integration tests against a live render server
//!
//! All tests need the NeRF proxy listening on localhost:7007 and are
//! ignored by default.
//!
//! Run with: cargo test --test remote_integration_tests -- --ignored

use std::rc::Rc;
use std::time::{Duration, Instant};
use syncview_core::syncview::viewport::{RemoteViewport, Viewport};
use syncview_core::syncview::{CameraBus, CameraPose, RemoteConfig, Scheduler, SceneConfig};
use syncview_remote_http::{fetch_inputs, input_image_url, HttpFrameTransport};

const SERVER: &str = "http://localhost:7007";

#[test]
#[ignore] // Requires a render server
fn test_remote_pane_receives_frame() {
    let bus = CameraBus::new(Rc::new(Scheduler::new()));
    let config = RemoteConfig::default();
    let transport = HttpFrameTransport::from_config(&config).unwrap();
    let mut nerf = RemoteViewport::new("nerf", "NeRF", bus.clone(), Box::new(transport), config);
    nerf.mount().unwrap();
    nerf.attach_scene(Rc::new(SceneConfig::named("live").with_remote(SERVER)));

    bus.emit(CameraPose::default(), "mesh");

    let deadline = Instant::now() + Duration::from_secs(10);
    while nerf.frames_received() == 0 && Instant::now() < deadline {
        nerf.tick(Instant::now());
        std::thread::sleep(Duration::from_millis(20));
    }

    assert_eq!(nerf.frames_received(), 1);
    let frame = nerf.frame().unwrap();
    assert_eq!(frame.content_type, "image/png");
    assert_eq!(nerf.status(), "");
}

#[test]
#[ignore] // Requires a render server exposing /inputs
fn test_inputs_listing() {
    let info = fetch_inputs(SERVER).unwrap();
    assert!(info.cameras.len() <= info.count);
    assert!(input_image_url(SERVER, 0).ends_with("/inputs/image/0"));
}
