//! Runtime configuration.
//!
//! Everything here has compiled-in defaults. The only value read from the
//! environment is the native asset directory (`FLOW_VIGNETTE_ASSETS`).

use crate::data_structures::material::Color;

pub const ASSETS_ENV: &str = "FLOW_VIGNETTE_ASSETS";

/// Directory assets are read from on native targets.
#[cfg(not(target_arch = "wasm32"))]
pub fn asset_root() -> std::path::PathBuf {
    match std::env::var_os(ASSETS_ENV) {
        Some(dir) => std::path::PathBuf::from(dir),
        None => std::path::Path::new("./").join("assets"),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadowMapKind {
    #[default]
    Basic,
    PcfSoft,
}

/// Renderer shadow settings. Carried through the context; no shadow pass is
/// rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowSettings {
    pub enabled: bool,
    pub kind: ShadowMapKind,
}

/// Initial window configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "flow-vignette".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Parameters of the per-frame focal object motion and pointer handling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionConfig {
    /// Rotation added about Z and Y every tick, in radians.
    pub spin_per_tick: f32,
    /// Radians per dragged pixel when rotating the focal object.
    pub drag_rotate_speed: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            spin_per_tick: 0.01,
            drag_rotate_speed: 0.01,
        }
    }
}

/// Parameters of the outdoor drag-look camera and background track.
#[derive(Clone, Debug, PartialEq)]
pub struct OutdoorConfig {
    pub look_sensitivity: f32,
    pub zoom_speed: f32,
    pub music: String,
    pub music_volume: f32,
    pub scatter_half_extent: f32,
}

impl Default for OutdoorConfig {
    fn default() -> Self {
        Self {
            look_sensitivity: 0.01,
            zoom_speed: 0.1,
            music: "nobita/music.mp3".to_string(),
            music_volume: 0.3,
            scatter_half_extent: 500.0,
        }
    }
}

pub const PRIMITIVE_CLEAR_COLOUR: (u8, u8, u8) = (164, 164, 164);

pub fn primitive_clear_colour() -> Color {
    let (r, g, b) = PRIMITIVE_CLEAR_COLOUR;
    Color::rgb(r, g, b)
}
