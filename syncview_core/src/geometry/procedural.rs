//! Procedural geometry.
//!
//! Two families:
//! - **Fallbacks**: substitutes for an asset that failed to load. Seeded
//!   from a fixed-width hash of the asset reference and generated with
//!   ChaCha8, so the same failing reference yields identical vertices and
//!   colours on every run and every target.
//! - **Demo assets**: the shapes the demo scene ships with (torus-knot
//!   mesh, cube-surface point cloud, torus-knot splat points).

use std::f32::consts::TAU;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use super::geometry::{Geometry, Vertex};

// ============================================================================
// SEEDING
// ============================================================================

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable seed derived from an asset reference (64-bit FNV-1a over its UTF-8 bytes)
pub fn seed_for(asset_ref: &str) -> u64 {
    asset_ref.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

// ============================================================================
// FALLBACKS
// ============================================================================

const FALLBACK_MESH_TUBULAR: usize = 220;
const FALLBACK_MESH_RADIAL: usize = 50;
const FALLBACK_POINT_COUNT: usize = 20_000;
const FALLBACK_POINT_COLOR: [f32; 3] = [0x66 as f32 / 255.0, 0xcc as f32 / 255.0, 1.0];

/// Torus knot (p=2, q=3, radius 1, tube 0.3) with seeded gradient colours
pub fn fallback_mesh(asset_ref: &str) -> Geometry {
    let mut rng = seeded_rng(seed_for(asset_ref));
    let tint = [
        rng.random_range(0.8..1.0_f32),
        rng.random_range(0.8..1.0_f32),
        rng.random_range(0.8..1.0_f32),
    ];

    let (mut vertices, indices) = knot_tube(1.0, 0.3, FALLBACK_MESH_TUBULAR, FALLBACK_MESH_RADIAL);
    for vertex in &mut vertices {
        let p = vertex.position();
        let gradient = gradient_color(p);
        let jitter = rng.random_range(-0.03..0.03_f32);
        vertex.color = [
            (gradient[0] * tint[0] + jitter).clamp(0.0, 1.0),
            (gradient[1] * tint[1] + jitter).clamp(0.0, 1.0),
            (gradient[2] * tint[2] + jitter).clamp(0.0, 1.0),
        ];
    }

    // knot_tube only emits in-range indices
    match Geometry::indexed_triangles(format!("fallback:{}", asset_ref), vertices.clone(), indices) {
        Ok(geometry) => geometry,
        Err(_) => Geometry::points(format!("fallback:{}", asset_ref), vertices),
    }
}

/// Uniform cube cloud in [-1, 1]³ coloured around #66ccff
pub fn fallback_points(asset_ref: &str) -> Geometry {
    let mut rng = seeded_rng(seed_for(asset_ref));
    let vertices = (0..FALLBACK_POINT_COUNT)
        .map(|_| {
            let position = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            let shade = rng.random_range(0.85..1.0_f32);
            Vertex::new(position, FALLBACK_POINT_COLOR.map(|c| c * shade))
        })
        .collect();
    Geometry::points(format!("fallback:{}", asset_ref), vertices)
}

// ============================================================================
// DEMO ASSETS
// ============================================================================

/// Cube corners and triangle faces the demo cloud is sampled from
const CUBE_CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0],
];
const CUBE_FACES: [[usize; 3]; 12] = [
    [0, 1, 2], [0, 2, 3], [4, 6, 5], [4, 7, 6], [0, 4, 5], [0, 5, 1],
    [3, 2, 6], [3, 6, 7], [0, 3, 7], [0, 7, 4], [1, 5, 6], [1, 6, 2],
];
const CUBE_SIDE_COLORS: [[u8; 3]; 6] = [
    [200, 60, 60], [60, 200, 60], [60, 60, 200], [220, 180, 60], [200, 60, 200], [60, 200, 200],
];
const CUBE_SAMPLES_PER_FACE: usize = 60;

/// Linear congruential generator used by the demo cloud (seed 42)
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f32 {
        self.0 = (self.0 * 1_664_525 + 1_013_904_223) % 4_294_967_296;
        (self.0 as f64 / 4_294_967_296.0) as f32
    }
}

/// 720 points on the surface of the [-1, 1]³ cube, one colour per side
pub fn cube_surface_points() -> Geometry {
    let mut lcg = Lcg(42);
    let mut vertices = Vec::with_capacity(CUBE_FACES.len() * CUBE_SAMPLES_PER_FACE);

    for (face_index, [a, b, c]) in CUBE_FACES.iter().enumerate() {
        let (pa, pb, pc) = (
            Vec3::from(CUBE_CORNERS[*a]),
            Vec3::from(CUBE_CORNERS[*b]),
            Vec3::from(CUBE_CORNERS[*c]),
        );
        let color = CUBE_SIDE_COLORS[face_index / 2].map(|c| c as f32 / 255.0);

        for _ in 0..CUBE_SAMPLES_PER_FACE {
            let (mut u1, mut u2) = (lcg.next_unit(), lcg.next_unit());
            if u1 + u2 > 1.0 {
                u1 = 1.0 - u1;
                u2 = 1.0 - u2;
            }
            vertices.push(Vertex::new(pa + u1 * (pb - pa) + u2 * (pc - pa), color));
        }
    }

    Geometry::points("demo_cloud", vertices)
}

/// Torus-knot surface mesh (100 × 20 grid) with position-gradient colours
pub fn torus_knot_mesh() -> Geometry {
    const U_RES: usize = 100;
    const V_RES: usize = 20;
    const P: f32 = 2.0;
    const Q: f32 = 3.0;
    const R: f32 = 1.0;
    const TUBE: f32 = 0.3;

    let mut vertices = Vec::with_capacity(U_RES * V_RES);
    for i in 0..U_RES {
        let u = TAU * i as f32 / U_RES as f32;
        for j in 0..V_RES {
            let v = TAU * j as f32 / V_RES as f32;
            let ring = R + TUBE * v.cos();
            let position = Vec3::new(
                ring * (u * P).cos() * v.cos(),
                ring * (u * P).sin() * v.cos(),
                TUBE * v.sin() + TUBE * (u * Q).sin(),
            );
            vertices.push(Vertex::new(position, gradient_color(position)));
        }
    }

    let mut indices = Vec::with_capacity((U_RES - 1) * (V_RES - 1) * 6);
    for i in 0..U_RES - 1 {
        for j in 0..V_RES - 1 {
            let v0 = (i * V_RES + j) as u32;
            let v1 = (i * V_RES + j + 1) as u32;
            let v2 = ((i + 1) * V_RES + j) as u32;
            let v3 = ((i + 1) * V_RES + j + 1) as u32;
            indices.extend_from_slice(&[v0, v2, v1, v1, v2, v3]);
        }
    }

    match Geometry::indexed_triangles("demo_mesh", vertices.clone(), indices) {
        Ok(geometry) => geometry,
        Err(_) => Geometry::points("demo_mesh", vertices),
    }
}

/// Noisy torus-knot curve sampled `count` times (what the demo splat file holds)
pub fn torus_knot_points(count: usize) -> Geometry {
    const P: f32 = 2.0;
    const Q: f32 = 3.0;
    const R: f32 = 1.0;
    const TUBE: f32 = 0.5;
    let mut rng = seeded_rng(42);
    let steps = count.saturating_sub(1).max(1) as f32;

    let vertices = (0..count)
        .map(|i| {
            let t = TAU * i as f32 / steps;
            let curve = Vec3::new(
                (R + TUBE * (Q * t).cos()) * (P * t).cos(),
                (R + TUBE * (Q * t).cos()) * (P * t).sin(),
                TUBE * (Q * t).sin(),
            );
            let noise = Vec3::new(
                rng.random_range(-0.08..0.08),
                rng.random_range(-0.08..0.08),
                rng.random_range(-0.08..0.08),
            );
            Vertex::new(curve + noise, gradient_color(curve))
        })
        .collect();

    Geometry::points("demo_splats", vertices)
}

// ============================================================================
// HELPERS
// ============================================================================

/// Colour gradient over the knot's extent
fn gradient_color(p: Vec3) -> [f32; 3] {
    [
        ((p.x + 1.5) / 3.0).clamp(0.0, 1.0),
        ((p.y + 1.5) / 3.0).clamp(0.0, 1.0),
        ((p.z + 1.0) / 2.0).clamp(0.0, 1.0),
    ]
}

/// Point on the (2, 3) torus-knot curve
fn knot_curve(u: f32, radius: f32) -> Vec3 {
    let (p, q) = (2.0_f32, 3.0_f32);
    let quo = q / p * u;
    let cs = quo.cos();
    Vec3::new(
        radius * (2.0 + cs) * 0.5 * u.cos(),
        radius * (2.0 + cs) * 0.5 * u.sin(),
        radius * quo.sin() * 0.5,
    )
}

/// Tube swept along the knot curve, `tubular × radial` grid with wrap-around seams
fn knot_tube(radius: f32, tube: f32, tubular: usize, radial: usize) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity((tubular + 1) * (radial + 1));

    for i in 0..=tubular {
        // The (2, 3) knot closes after two turns of the parameter
        let u = i as f32 / tubular as f32 * 2.0 * TAU;
        let p1 = knot_curve(u, radius);
        let p2 = knot_curve(u + 0.01, radius);

        let tangent = p2 - p1;
        let binormal = tangent.cross(p2 + p1).normalize_or_zero();
        let normal = binormal.cross(tangent).normalize_or_zero();

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            vertices.push(Vertex::new(p1 + cx * normal + cy * binormal, [0.0; 3]));
        }
    }

    let mut indices = Vec::with_capacity(tubular * radial * 6);
    for j in 1..=tubular {
        for i in 1..=radial {
            let a = ((radial + 1) * (j - 1) + (i - 1)) as u32;
            let b = ((radial + 1) * j + (i - 1)) as u32;
            let c = ((radial + 1) * j + i) as u32;
            let d = ((radial + 1) * (j - 1) + i) as u32;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    (vertices, indices)
}

#[cfg(test)]
#[path = "procedural_tests.rs"]
mod tests;
