//! Procedural primitive geometry.
//!
//! Vertex order, uv layout and triangle winding follow the generators of the
//! common web 3D toolkits so that assets and textures authored against them
//! line up. Every builder is a pure function of its arguments.

use std::f32::consts::PI;

use cgmath::InnerSpace;

use crate::data_structures::geometry::Geometry;

/// Flat rectangle in the XY plane facing +Z.
pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let grid_x = width_segments.max(1);
    let grid_y = height_segments.max(1);
    let grid_x1 = grid_x + 1;
    let grid_y1 = grid_y + 1;
    let segment_width = width / grid_x as f32;
    let segment_height = height / grid_y as f32;

    let mut geometry =
        Geometry::with_capacity((grid_x1 * grid_y1) as usize, (grid_x * grid_y * 6) as usize);
    for iy in 0..grid_y1 {
        let y = iy as f32 * segment_height - height / 2.0;
        for ix in 0..grid_x1 {
            let x = ix as f32 * segment_width - width / 2.0;
            geometry.push_vertex(
                [x, -y, 0.0],
                [0.0, 0.0, 1.0],
                [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
            );
        }
    }
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + grid_x1 * iy;
            let b = ix + grid_x1 * (iy + 1);
            let c = (ix + 1) + grid_x1 * (iy + 1);
            let d = (ix + 1) + grid_x1 * iy;
            geometry.push_triangle(a, b, d);
            geometry.push_triangle(b, c, d);
        }
    }
    geometry
}

/// UV sphere; the poles are single-triangle fans per segment.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut geometry = Geometry::with_capacity(
        ((width_segments + 1) * (height_segments + 1)) as usize,
        (width_segments * (height_segments - 1) * 6) as usize,
    );
    let mut grid = Vec::with_capacity(height_segments as usize + 1);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };
        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;
            let theta = v * PI;
            let position = cgmath::Vector3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            let normal = safe_normalize(position);
            row.push(geometry.push_vertex(position.into(), normal, [u + u_offset, 1.0 - v]));
        }
        grid.push(row);
    }
    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                geometry.push_triangle(a, b, d);
            }
            if iy != height_segments as usize - 1 {
                geometry.push_triangle(b, c, d);
            }
        }
    }
    geometry
}

/// Cone with its apex at +height/2 and a closed base at -height/2.
pub fn cone(radius: f32, height: f32, radial_segments: u32, height_segments: u32) -> Geometry {
    let radial_segments = radial_segments.max(3);
    let height_segments = height_segments.max(1);
    let half_height = height / 2.0;
    // apex radius is zero, base radius is `radius`
    let slope = radius / height;

    let mut geometry = Geometry::default();
    let mut index_rows = Vec::with_capacity(height_segments as usize + 1);
    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let ring_radius = v * radius;
        let mut row = Vec::with_capacity(radial_segments as usize + 1);
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let theta = u * 2.0 * PI;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let normal = safe_normalize(cgmath::Vector3::new(sin_theta, slope, cos_theta));
            row.push(geometry.push_vertex(
                [
                    ring_radius * sin_theta,
                    -v * height + half_height,
                    ring_radius * cos_theta,
                ],
                normal,
                [u, 1.0 - v],
            ));
        }
        index_rows.push(row);
    }
    for x in 0..radial_segments as usize {
        for y in 0..height_segments as usize {
            let a = index_rows[y][x];
            let b = index_rows[y + 1][x];
            let c = index_rows[y + 1][x + 1];
            let d = index_rows[y][x + 1];
            // the apex row collapses to a point, so its first triangle is degenerate
            if y != 0 {
                geometry.push_triangle(a, b, d);
            }
            geometry.push_triangle(b, c, d);
        }
    }

    // base cap
    let center_start = geometry.vertex_count() as u32;
    for _ in 0..radial_segments {
        geometry.push_vertex([0.0, -half_height, 0.0], [0.0, -1.0, 0.0], [0.5, 0.5]);
    }
    let rim_start = geometry.vertex_count() as u32;
    for x in 0..=radial_segments {
        let u = x as f32 / radial_segments as f32;
        let (sin_theta, cos_theta) = (u * 2.0 * PI).sin_cos();
        geometry.push_vertex(
            [radius * sin_theta, -half_height, radius * cos_theta],
            [0.0, -1.0, 0.0],
            [cos_theta * 0.5 + 0.5, -sin_theta * 0.5 + 0.5],
        );
    }
    for x in 0..radial_segments {
        let c = center_start + x;
        let i = rim_start + x;
        geometry.push_triangle(i + 1, i, c);
    }
    geometry
}

/// Torus around the Z axis.
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Geometry {
    let radial_segments = radial_segments.max(2);
    let tubular_segments = tubular_segments.max(3);

    let mut geometry = Geometry::with_capacity(
        ((radial_segments + 1) * (tubular_segments + 1)) as usize,
        (radial_segments * tubular_segments * 6) as usize,
    );
    for j in 0..=radial_segments {
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * 2.0 * PI;
            let v = j as f32 / radial_segments as f32 * 2.0 * PI;
            let position = cgmath::Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = cgmath::Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
            geometry.push_vertex(
                position.into(),
                safe_normalize(position - center),
                [
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ],
            );
        }
    }
    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = (tubular_segments + 1) * j + i - 1;
            let b = (tubular_segments + 1) * (j - 1) + i - 1;
            let c = (tubular_segments + 1) * (j - 1) + i;
            let d = (tubular_segments + 1) * j + i;
            geometry.push_triangle(a, b, d);
            geometry.push_triangle(b, c, d);
        }
    }
    geometry
}

/// Newell teapot from its 32 bicubic Bezier patches.
///
/// `size` is the relative scale (the rim radius is roughly `size / 2`),
/// `tessellation` the number of segments per patch edge.
pub fn teapot(size: f32, tessellation: u32) -> Geometry {
    let tessellation = tessellation.max(1);
    let scale = size / 3.0;
    let per_patch = ((tessellation + 1) * (tessellation + 1)) as usize;
    let mut geometry = Geometry::with_capacity(
        per_patch * TEAPOT_PATCH_COUNT,
        TEAPOT_PATCH_COUNT * (tessellation * tessellation * 6) as usize,
    );

    for (patch_index, patch) in TEAPOT_PATCHES.iter().enumerate() {
        // rim, body, lid and bottom are mirrored into all four quadrants,
        // handle and spout only across the XZ plane
        let mirrors: &[(f32, f32)] = if patch_index < 6 {
            &[(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)]
        } else {
            &[(1.0, 1.0), (1.0, -1.0)]
        };
        for &(sx, sy) in mirrors {
            // a single mirror flips the winding, so walk the columns backwards
            let flip = sx * sy < 0.0;
            let mut control = [[cgmath::Vector3::new(0.0, 0.0, 0.0); 4]; 4];
            for (row, control_row) in control.iter_mut().enumerate() {
                for (col, point) in control_row.iter_mut().enumerate() {
                    let k = if flip { 3 - col } else { col };
                    let [x, y, z] = TEAPOT_VERTICES[patch[row * 4 + k]];
                    *point = cgmath::Vector3::new(x * sx, y * sy, z);
                }
            }
            tessellate_patch(&mut geometry, &control, tessellation, scale);
        }
    }
    geometry
}

fn tessellate_patch(
    geometry: &mut Geometry,
    control: &[[cgmath::Vector3<f32>; 4]; 4],
    tessellation: u32,
    scale: f32,
) {
    let base = geometry.vertex_count() as u32;
    let steps = tessellation as f32;
    for i in 0..=tessellation {
        let u = i as f32 / steps;
        for j in 0..=tessellation {
            let v = j as f32 / steps;
            let (point, du, dv) = eval_patch(control, u, v);
            let normal = du.cross(dv);
            // poles of the lid and the bottom have degenerate derivatives
            let normal = if normal.magnitude2() > f32::EPSILON {
                normal.normalize()
            } else if point.z > 1.5 {
                cgmath::Vector3::unit_z()
            } else {
                -cgmath::Vector3::unit_z()
            };
            // z-up to y-up, centred vertically
            geometry.push_vertex(
                [
                    point.x * scale,
                    (point.z - TEAPOT_HEIGHT / 2.0) * scale,
                    -point.y * scale,
                ],
                [normal.x, normal.z, -normal.y],
                [v, u],
            );
        }
    }
    let row = tessellation + 1;
    for i in 0..tessellation {
        for j in 0..tessellation {
            let a = base + i * row + j;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            geometry.push_triangle(a, c, b);
            geometry.push_triangle(b, c, d);
        }
    }
}

fn bernstein(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

fn bernstein_derivative(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [
        -3.0 * s * s,
        3.0 * s * s - 6.0 * t * s,
        6.0 * t * s - 3.0 * t * t,
        3.0 * t * t,
    ]
}

fn eval_patch(
    control: &[[cgmath::Vector3<f32>; 4]; 4],
    u: f32,
    v: f32,
) -> (
    cgmath::Vector3<f32>,
    cgmath::Vector3<f32>,
    cgmath::Vector3<f32>,
) {
    let (bu, bv) = (bernstein(u), bernstein(v));
    let (du, dv) = (bernstein_derivative(u), bernstein_derivative(v));
    let zero = cgmath::Vector3::new(0.0, 0.0, 0.0);
    let (mut point, mut tangent_u, mut tangent_v) = (zero, zero, zero);
    for (r, row) in control.iter().enumerate() {
        for (c, p) in row.iter().enumerate() {
            point += p * (bu[r] * bv[c]);
            tangent_u += p * (du[r] * bv[c]);
            tangent_v += p * (bu[r] * dv[c]);
        }
    }
    (point, tangent_u, tangent_v)
}

fn safe_normalize(v: cgmath::Vector3<f32>) -> [f32; 3] {
    if v.magnitude2() > 0.0 {
        v.normalize().into()
    } else {
        [0.0, 1.0, 0.0]
    }
}

/// Number of patches after mirroring.
const TEAPOT_PATCH_COUNT: usize = 6 * 4 + 4 * 2;

const TEAPOT_HEIGHT: f32 = 3.15;

#[rustfmt::skip]
const TEAPOT_PATCHES: [[usize; 16]; 10] = [
    // rim
    [102, 103, 104, 105, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    // body
    [12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27],
    [24, 25, 26, 27, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40],
    // lid
    [96, 96, 96, 96, 97, 98, 99, 100, 101, 101, 101, 101, 0, 1, 2, 3],
    [0, 1, 2, 3, 106, 107, 108, 109, 110, 111, 112, 113, 114, 115, 116, 117],
    // bottom
    [118, 118, 118, 118, 124, 122, 119, 121, 123, 126, 125, 120, 40, 39, 38, 37],
    // handle
    [41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56],
    [53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 28, 65, 66, 67],
    // spout
    [68, 69, 70, 71, 72, 73, 74, 75, 76, 77, 78, 79, 80, 81, 82, 83],
    [80, 81, 82, 83, 84, 85, 86, 87, 88, 89, 90, 91, 92, 93, 94, 95],
];

#[rustfmt::skip]
const TEAPOT_VERTICES: [[f32; 3]; 127] = [
    [0.2, 0.0, 2.7], [0.2, -0.112, 2.7], [0.112, -0.2, 2.7], [0.0, -0.2, 2.7],
    [1.3375, 0.0, 2.53125], [1.3375, -0.749, 2.53125],
    [0.749, -1.3375, 2.53125], [0.0, -1.3375, 2.53125],
    [1.4375, 0.0, 2.53125], [1.4375, -0.805, 2.53125],
    [0.805, -1.4375, 2.53125], [0.0, -1.4375, 2.53125],
    [1.5, 0.0, 2.4], [1.5, -0.84, 2.4], [0.84, -1.5, 2.4], [0.0, -1.5, 2.4],
    [1.75, 0.0, 1.875], [1.75, -0.98, 1.875], [0.98, -1.75, 1.875], [0.0, -1.75, 1.875],
    [2.0, 0.0, 1.35], [2.0, -1.12, 1.35], [1.12, -2.0, 1.35], [0.0, -2.0, 1.35],
    [2.0, 0.0, 0.9], [2.0, -1.12, 0.9], [1.12, -2.0, 0.9], [0.0, -2.0, 0.9],
    [-2.0, 0.0, 0.9], [2.0, 0.0, 0.45], [2.0, -1.12, 0.45], [1.12, -2.0, 0.45],
    [0.0, -2.0, 0.45], [1.5, 0.0, 0.225], [1.5, -0.84, 0.225], [0.84, -1.5, 0.225],
    [0.0, -1.5, 0.225], [1.5, 0.0, 0.15], [1.5, -0.84, 0.15], [0.84, -1.5, 0.15],
    [0.0, -1.5, 0.15], [-1.6, 0.0, 2.025], [-1.6, -0.3, 2.025], [-1.5, -0.3, 2.25],
    [-1.5, 0.0, 2.25], [-2.3, 0.0, 2.025], [-2.3, -0.3, 2.025], [-2.5, -0.3, 2.25],
    [-2.5, 0.0, 2.25], [-2.7, 0.0, 2.025], [-2.7, -0.3, 2.025], [-3.0, -0.3, 2.25],
    [-3.0, 0.0, 2.25], [-2.7, 0.0, 1.8], [-2.7, -0.3, 1.8], [-3.0, -0.3, 1.8],
    [-3.0, 0.0, 1.8], [-2.7, 0.0, 1.575], [-2.7, -0.3, 1.575], [-3.0, -0.3, 1.35],
    [-3.0, 0.0, 1.35], [-2.5, 0.0, 1.125], [-2.5, -0.3, 1.125], [-2.65, -0.3, 0.9375],
    [-2.65, 0.0, 0.9375], [-2.0, -0.3, 0.9], [-1.9, -0.3, 0.6], [-1.9, 0.0, 0.6],
    [1.7, 0.0, 1.425], [1.7, -0.66, 1.425], [1.7, -0.66, 0.6], [1.7, 0.0, 0.6],
    [2.6, 0.0, 1.425], [2.6, -0.66, 1.425], [3.1, -0.66, 0.825], [3.1, 0.0, 0.825],
    [2.3, 0.0, 2.1], [2.3, -0.25, 2.1], [2.4, -0.25, 2.025], [2.4, 0.0, 2.025],
    [2.7, 0.0, 2.4], [2.7, -0.25, 2.4], [3.3, -0.25, 2.4], [3.3, 0.0, 2.4],
    [2.8, 0.0, 2.475], [2.8, -0.25, 2.475], [3.525, -0.25, 2.49375], [3.525, 0.0, 2.49375],
    [2.9, 0.0, 2.475], [2.9, -0.15, 2.475], [3.45, -0.15, 2.5125], [3.45, 0.0, 2.5125],
    [2.8, 0.0, 2.4], [2.8, -0.15, 2.4], [3.2, -0.15, 2.4], [3.2, 0.0, 2.4],
    [0.0, 0.0, 3.15], [0.8, 0.0, 3.15], [0.8, -0.45, 3.15], [0.45, -0.8, 3.15],
    [0.0, -0.8, 3.15], [0.0, 0.0, 2.85], [1.4, 0.0, 2.4], [1.4, -0.784, 2.4],
    [0.784, -1.4, 2.4], [0.0, -1.4, 2.4], [0.4, 0.0, 2.55], [0.4, -0.224, 2.55],
    [0.224, -0.4, 2.55], [0.0, -0.4, 2.55], [1.3, 0.0, 2.55], [1.3, -0.728, 2.55],
    [0.728, -1.3, 2.55], [0.0, -1.3, 2.55], [1.3, 0.0, 2.4], [1.3, -0.728, 2.4],
    [0.728, -1.3, 2.4], [0.0, -1.3, 2.4], [0.0, 0.0, 0.0], [1.425, -0.798, 0.0],
    [1.5, 0.0, 0.075], [1.425, 0.0, 0.0], [0.798, -1.425, 0.0], [0.0, -1.5, 0.075],
    [0.0, -1.425, 0.0], [1.5, -0.84, 0.075], [0.84, -1.5, 0.075],
];
