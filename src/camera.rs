//! Camera, projection, GPU camera uniform and pointer driven controllers.
//!
//! The camera orientation uses yaw about +Y followed by pitch about +X (YXZ
//! order); at zero yaw and pitch it looks down -Z.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4};
use instant::Duration;

use crate::input::PointerEvent;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn looking_at<V: Into<Point3<f32>>>(position: V, target: Point3<f32>) -> Self {
        let mut camera = Self::new(position, Rad(0.0), Rad(0.0));
        camera.look_at(target);
        camera
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        Vector3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Turns the camera towards `target`. A target at the camera position keeps the orientation.
    pub fn look_at(&mut self, target: Point3<f32>) {
        let direction = target - self.position;
        if direction.magnitude2() == 0.0 {
            return;
        }
        let direction = direction.normalize();
        self.pitch = Rad(direction.y.clamp(-1.0, 1.0).asin());
        self.yaw = Rad((-direction.x).atan2(-direction.z));
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }

    /// Builds a world-space ray through the given cursor position.
    pub fn cast_ray_from_mouse(
        &self,
        x: f64,
        y: f64,
        width: f32,
        height: f32,
        projection: &Projection,
    ) -> Option<Ray> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let ndc_x = 2.0 * x as f32 / width - 1.0;
        let ndc_y = 1.0 - 2.0 * y as f32 / height;
        let inverse = (projection.calc_matrix() * self.calc_matrix()).invert()?;
        let unproject = |z: f32| {
            let p = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            Point3::new(p.x / p.w, p.y / p.w, p.z / p.w)
        };
        let near = unproject(0.0);
        let far = unproject(1.0);
        let direction = far - near;
        if direction.magnitude2() == 0.0 {
            return None;
        }
        Some(Ray {
            origin: near,
            direction: direction.normalize(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Distance along the ray to the first intersection with a sphere.
    pub fn intersect_sphere(&self, center: Point3<f32>, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.magnitude2() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt = discriminant.sqrt();
        let near = -b - sqrt;
        let far = -b + sqrt;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            // origin inside the sphere
            Some(0.0)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn znear(&self) -> f32 {
        self.znear
    }

    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    /// Camera position in xyz, viewport aspect ratio in w.
    pub fn view_position(&self) -> [f32; 4] {
        self.view_position
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        // w carries the aspect ratio for the point sprites
        let position = camera.position;
        self.view_position = [position.x, position.y, position.z, projection.aspect()];
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

/// Camera controller selected by a flow during `on_init`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CameraController {
    #[default]
    None,
    Orbit(OrbitController),
    DragLook(DragLookController),
}

impl CameraController {
    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        match self {
            CameraController::None => (),
            CameraController::Orbit(orbit) => orbit.handle_pointer(event),
            CameraController::DragLook(drag) => drag.handle_pointer(event),
        }
    }

    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        match self {
            CameraController::None => (),
            CameraController::Orbit(orbit) => orbit.update(camera, dt),
            CameraController::DragLook(drag) => drag.update(camera, dt),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            CameraController::None => (),
            CameraController::Orbit(orbit) => orbit.enabled = enabled,
            CameraController::DragLook(drag) => drag.enabled = enabled,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let CameraController::Orbit(orbit) = self {
            orbit.resize(width, height);
        }
    }
}

/// Rotates the camera around a target on left drag and dollies on wheel.
///
/// A full viewport-height drag turns the camera by `2π * rotate_speed`.
/// Polar angle is kept inside `(0, π)` so the camera never flips over the pole.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitController {
    pub target: Point3<f32>,
    pub enabled: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    viewport_height: f32,
    dragging: bool,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitController {
    pub fn new(target: Point3<f32>, viewport_height: u32) -> Self {
        Self {
            target,
            enabled: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            viewport_height: viewport_height.max(1) as f32,
            dragging: false,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    pub fn resize(&mut self, _width: u32, height: u32) {
        if height > 0 {
            self.viewport_height = height as f32;
        }
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        if !self.enabled {
            self.dragging = false;
            return;
        }
        match *event {
            PointerEvent::Down {
                button: winit::event::MouseButton::Left,
                ..
            } => self.dragging = true,
            PointerEvent::Up { .. } => self.dragging = false,
            PointerEvent::Move { dx, dy, .. } if self.dragging => {
                let per_pixel = 2.0 * PI * self.rotate_speed / self.viewport_height;
                self.delta_theta -= dx as f32 * per_pixel;
                self.delta_phi -= dy as f32 * per_pixel;
            }
            PointerEvent::Wheel { delta_y } => {
                let step = 0.95f32.powf(self.zoom_speed);
                if delta_y > 0.0 {
                    self.scale /= step;
                } else if delta_y < 0.0 {
                    self.scale *= step;
                }
            }
            _ => (),
        }
    }

    pub fn update(&mut self, camera: &mut Camera, _dt: Duration) {
        let offset = camera.position - self.target;
        let radius = offset.magnitude();
        if radius > 0.0 {
            let theta = offset.x.atan2(offset.z) + self.delta_theta;
            let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + self.delta_phi)
                .clamp(1e-6, PI - 1e-6);
            let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
            let offset = Vector3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
            camera.position = self.target + offset;
            camera.look_at(self.target);
        }
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
    }
}

/// Free-look: dragging changes yaw and pitch, the wheel moves the camera
/// along world Z. Neither is clamped.
#[derive(Clone, Debug, PartialEq)]
pub struct DragLookController {
    pub enabled: bool,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    dragging: bool,
    yaw: f32,
    pitch: f32,
    zoom: f32,
}

impl DragLookController {
    pub fn new(sensitivity: f32, zoom_speed: f32) -> Self {
        Self {
            enabled: true,
            sensitivity,
            zoom_speed,
            dragging: false,
            yaw: 0.0,
            pitch: 0.0,
            zoom: 0.0,
        }
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        if !self.enabled {
            self.dragging = false;
            return;
        }
        match *event {
            PointerEvent::Down { .. } => self.dragging = true,
            PointerEvent::Up { .. } => self.dragging = false,
            PointerEvent::Move { dx, dy, .. } if self.dragging => {
                self.yaw += dx as f32 * self.sensitivity;
                self.pitch += dy as f32 * self.sensitivity;
            }
            PointerEvent::Wheel { delta_y } => self.zoom += delta_y as f32 * self.zoom_speed,
            _ => (),
        }
    }

    pub fn update(&mut self, camera: &mut Camera, _dt: Duration) {
        camera.yaw += Rad(self.yaw);
        camera.pitch += Rad(self.pitch);
        camera.position.z -= self.zoom;
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.zoom = 0.0;
    }
}
