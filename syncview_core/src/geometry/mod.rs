//! Geometry module: CPU-side renderable data handed to render backends.
//!
//! Asset loaders produce [`Geometry`]; when they fail, the procedural
//! module builds a deterministic substitute so a pane is never empty.

mod geometry;
pub mod procedural;

pub use geometry::{Geometry, Topology, Vertex};
pub use procedural::{
    fallback_mesh, fallback_points, cube_surface_points, torus_knot_mesh, torus_knot_points,
};
