//! Random scenery placement.
//!
//! Every helper takes the random source as a parameter so demos can use
//! `rand::thread_rng()` while tests pass a seeded `StdRng`.

use cgmath::Vector3;
use rand::Rng;

use crate::{data_structures::material::Color, resources::loader::LoadRequest};

pub const FOLIAGE_BASE: &str = "nature/glb/";
pub const CLOUD_BASE: &str = "nature2/glb/";
pub const ANIMAL_BASE: &str = "animal/";

pub const FOLIAGE_NAMES: [&str; 15] = [
    "BirchTree",
    "BirchTree_Autumn",
    "BirchTree_Dead",
    "Cactus",
    "CactusFlowers",
    "CommonTree",
    "CommonTree_Autumn",
    "Willow",
    "Willow_Autumn",
    "PineTree",
    "PineTree_Autumn",
    "Rock",
    "Rock_Moss",
    "Plant",
    "PalmTree",
];

pub const FOLIAGE_COUNT: usize = 10;
pub const FOLIAGE_VARIANTS: (u32, u32) = (1, 5);
pub const FOLIAGE_SCALE: f32 = 0.25;

pub const CLOUD_COUNT: usize = 8;
pub const CLOUD_VARIANTS: (u32, u32) = (1, 3);
pub const CLOUD_HEIGHT: f32 = 150.0;
pub const CLOUD_SCALE: (f32, f32) = (10.0, 15.0);
pub const CLOUD_EMISSIVE: u32 = 0x808080;

pub const ANIMAL_COUNT: usize = 5;
pub const ANIMAL_MODEL: &str = "Deer.glb";
pub const ANIMAL_SCALE: f32 = 0.1;

/// Uniform integer in `lo..=hi`.
pub fn rand_int<R: Rng + ?Sized>(rng: &mut R, lo: u32, hi: u32) -> u32 {
    rng.gen_range(lo..=hi)
}

/// Uniform position in the square `[-half_extent, half_extent]^2` on the XZ
/// plane at height `y`.
pub fn rand_position<R: Rng + ?Sized>(rng: &mut R, half_extent: f32, y: f32) -> Vector3<f32> {
    let x = rng.gen_range(-half_extent..=half_extent);
    let z = rng.gen_range(-half_extent..=half_extent);
    Vector3::new(x, y, z)
}

pub fn foliage<R: Rng + ?Sized>(rng: &mut R, count: usize, half_extent: f32) -> Vec<LoadRequest> {
    (0..count)
        .map(|_| {
            let name = FOLIAGE_NAMES[rng.gen_range(0..FOLIAGE_NAMES.len())];
            let index = rand_int(rng, FOLIAGE_VARIANTS.0, FOLIAGE_VARIANTS.1);
            LoadRequest::new(FOLIAGE_BASE, &format!("{}_{}.glb", name, index))
                .at(rand_position(rng, half_extent, 0.0))
                .scaled(FOLIAGE_SCALE)
                .with_shadows(true, true)
                .with_emissive(Color::BLACK)
        })
        .collect()
}

pub fn clouds<R: Rng + ?Sized>(rng: &mut R, count: usize, half_extent: f32) -> Vec<LoadRequest> {
    (0..count)
        .map(|_| {
            let index = rand_int(rng, CLOUD_VARIANTS.0, CLOUD_VARIANTS.1);
            let position = rand_position(rng, half_extent, CLOUD_HEIGHT);
            let scale = Vector3::new(
                rng.gen_range(CLOUD_SCALE.0..CLOUD_SCALE.1),
                rng.gen_range(CLOUD_SCALE.0..CLOUD_SCALE.1),
                rng.gen_range(CLOUD_SCALE.0..CLOUD_SCALE.1),
            );
            LoadRequest::new(CLOUD_BASE, &format!("Cloud{}.glb", index))
                .at(position)
                .with_scale(scale)
                .with_emissive(Color::hex(CLOUD_EMISSIVE))
        })
        .collect()
}

pub fn animals<R: Rng + ?Sized>(rng: &mut R, count: usize, half_extent: f32) -> Vec<LoadRequest> {
    (0..count)
        .map(|_| {
            LoadRequest::new(ANIMAL_BASE, ANIMAL_MODEL)
                .at(rand_position(rng, half_extent, 0.0))
                .scaled(ANIMAL_SCALE)
        })
        .collect()
}
