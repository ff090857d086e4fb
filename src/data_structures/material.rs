//! Colours and surface materials of scene nodes.

use std::sync::Arc;

/// Linear-ish RGB colour with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// `rgb(r, g, b)` with 8 bit channels.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// `0xRRGGBB`.
    pub fn hex(hex: u32) -> Self {
        Self::rgb(
            ((hex >> 16) & 0xff) as u8,
            ((hex >> 8) & 0xff) as u8,
            (hex & 0xff) as u8,
        )
    }

    /// Hue, saturation and lightness, each in `[0, 1]`.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        if s == 0.0 {
            return Self::new(l, l, l);
        }
        let p = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let q = 2.0 * l - p;
        Self::new(
            hue_to_rgb(q, p, h + 1.0 / 3.0),
            hue_to_rgb(q, p, h),
            hue_to_rgb(q, p, h - 1.0 / 3.0),
        )
    }

    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        Color::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_vec4(&self, w: f32) -> [f32; 4] {
        [self.r, self.g, self.b, w]
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: 1.0,
        }
    }
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Which faces of a mesh are rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Image map of a material. `image` stays `None` until the fetch completes.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureMap {
    pub path: String,
    pub repeat: [f32; 2],
    pub image: Option<Arc<image::RgbaImage>>,
}

impl TextureMap {
    pub fn new(path: &str, repeat: [f32; 2]) -> Self {
        Self {
            path: path.to_string(),
            repeat,
            image: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }
}

/// Surface description of a solid mesh.
///
/// `revision` is bumped on every change the GPU mirror has to pick up (a
/// texture arriving, a colour edit).
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub emissive: Color,
    pub map: Option<TextureMap>,
    pub side: Side,
    /// Ignore scene lights.
    pub unlit: bool,
    pub revision: u64,
}

impl Material {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            emissive: Color::BLACK,
            map: None,
            side: Side::Front,
            unlit: false,
            revision: 0,
        }
    }

    pub fn unlit(color: Color) -> Self {
        Self {
            unlit: true,
            ..Self::new(color)
        }
    }

    pub fn with_map(mut self, map: TextureMap) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn set_emissive(&mut self, emissive: Color) {
        self.emissive = emissive;
        self.revision += 1;
    }

    /// Attaches a decoded image to the map, if the material has one.
    pub fn apply_texture(&mut self, image: Arc<image::RgbaImage>) -> bool {
        match self.map.as_mut() {
            Some(map) => {
                map.image = Some(image);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        let repeat = self.map.as_ref().map(|m| m.repeat).unwrap_or([1.0, 1.0]);
        MaterialUniform {
            color: self.color.to_vec4(if self.unlit { 1.0 } else { 0.0 }),
            emissive: self.emissive.to_vec4(0.0),
            params: [repeat[0], repeat[1], 0.0, 0.0],
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

/// Flat-coloured material of a point cloud.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointsMaterial {
    pub color: Color,
    /// Side of the square drawn per point, attenuated with distance the way
    /// three.js does: `size * viewport_height / 2 / depth` pixels.
    pub size: f32,
}

impl PointsMaterial {
    pub fn new(color: Color, size: f32) -> Self {
        Self { color, size }
    }

    /// On-screen side in pixels of a point `depth` units in front of the camera.
    pub fn pixel_size(&self, depth: f32, viewport_height: f32) -> f32 {
        self.size * viewport_height * 0.5 / depth
    }

    /// Points are flat coloured, so the uniform is always unlit.
    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            color: self.color.to_vec4(1.0),
            emissive: Color::BLACK.to_vec4(0.0),
            params: [1.0, 1.0, self.size, 0.0],
        }
    }
}

/// Bind group 0, binding 2 of the solid shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    /// w is 1 for unlit materials.
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    /// xy: uv repeat, z: point size
    pub params: [f32; 4],
}
