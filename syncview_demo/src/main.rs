/// SyncView demo entry point
///
/// Runs the four-pane viewer headlessly: the mesh pane drives, the point
/// cloud and splat panes follow, and the NeRF pane pulls frames from the
/// render server named in the scene.
///
/// Usage: syncview_demo [scene.json] [viewer.json]

use std::env;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use syncview_core::syncview::backend::headless_factory;
use syncview_core::syncview::camera::CameraInput;
use syncview_core::syncview::collaborators::{MemoryAssetLoader, UnavailableDelegate};
use syncview_core::syncview::geometry::{cube_surface_points, torus_knot_mesh, torus_knot_points};
use syncview_core::syncview::viewport::{DelegateViewport, LocalContent, LocalViewport, RemoteViewport};
use syncview_core::syncview::{SceneConfig, ViewerConfig, ViewerController};
use syncview_core::viewer_info;
use syncview_remote_http::HttpFrameTransport;

const LOG_SOURCE: &str = "syncview::Demo";

const DEMO_SCENE: &str = r#"{
    "name": "Demo",
    "nerf": { "serverUrl": "http://localhost:7007", "stream": false },
    "pointCloud": { "ply": "/scenes/demo/points.ply" },
    "mesh": { "gltf": "/scenes/demo/mesh.glb" },
    "splats": { "ply": "/scenes/demo/splats.ply" },
    "initialCamera": { "position": [3, 2, 3], "target": [0, 0, 0], "up": [0, 1, 0], "fov": 50 }
}"#;

const FRAME_COUNT: u32 = 120;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn demo_loader() -> MemoryAssetLoader {
    MemoryAssetLoader::new()
        .with("/scenes/demo/mesh.glb", torus_knot_mesh())
        .with("/scenes/demo/points.ply", cube_surface_points())
        .with("/scenes/demo/splats.ply", torus_knot_points(20_000))
}

fn build_viewer(config: ViewerConfig) -> Result<ViewerController, Box<dyn std::error::Error>> {
    let mut controller = ViewerController::new(config);
    let bus = controller.bus().clone();
    let config = controller.config().clone();
    let loader = Rc::new(demo_loader());
    let (width, height) = (config.surface_width, config.surface_height);

    let transport = HttpFrameTransport::from_config(&config.remote)?;
    controller.add_viewport(Box::new(RemoteViewport::new(
        "nerf", "NeRF (Server/Client)", bus.clone(), Box::new(transport), config.remote.clone(),
    )))?;
    controller.add_viewport(Box::new(LocalViewport::new(
        "cloud", "Point Cloud", LocalContent::PointCloud, bus.clone(), loader.clone(),
        headless_factory(width, height), &config,
    )))?;
    controller.add_viewport(Box::new(LocalViewport::new(
        "mesh", "MVS Mesh", LocalContent::Mesh, bus.clone(), loader.clone(),
        headless_factory(width, height), &config,
    )))?;
    controller.add_viewport(Box::new(DelegateViewport::new(
        "splats", "Gaussian Splats", bus, Rc::new(UnavailableDelegate), loader,
        headless_factory(width, height), &config,
    )))?;

    Ok(controller)
}

fn print_panes(controller: &ViewerController) {
    for viewport in controller.viewports() {
        let status = viewport.status();
        println!(
            "  {:<22} {:<8} {}{}",
            viewport.title(),
            viewport.role_label(),
            viewport.metrics(),
            if status.is_empty() { String::new() } else { format!("  [{}]", status) },
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 3 {
        eprintln!("Usage: {} [scene.json] [viewer.json]", args[0]);
        std::process::exit(1);
    }

    let scene = match args.get(1) {
        Some(path) => SceneConfig::load(Path::new(path))?,
        None => SceneConfig::from_json_str(DEMO_SCENE)?,
    };
    let config = match args.get(2) {
        Some(path) => ViewerConfig::load(Path::new(path))?,
        None => ViewerConfig::default(),
    };

    let mut controller = build_viewer(config)?;
    controller.start()?;
    controller.load_scene(scene);

    let start = Instant::now();
    for frame in 0..FRAME_COUNT {
        if frame == FRAME_COUNT / 2 {
            if let Some(cloud) = controller.viewport("cloud") {
                cloud.request_driver();
            }
        }

        let driver = controller.driver_id().unwrap_or_default();
        controller.handle_input(&driver, CameraInput::Orbit { yaw: 0.02, pitch: 0.0 })?;
        controller.tick(start + FRAME_INTERVAL * frame);
        std::thread::sleep(FRAME_INTERVAL);
    }

    viewer_info!(LOG_SOURCE, "Ran {} frames, {} poses emitted", FRAME_COUNT, controller.bus().emitted_count());
    println!("Driver: {}", controller.driver_id().unwrap_or_default());
    print_panes(&controller);

    controller.unmount_all();
    Ok(())
}
