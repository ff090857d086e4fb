//! Engine data structures: scene graph, geometry, materials and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `scene_graph` enables hierarchical scene organization (nodes, lights, fog)
//! - `geometry` holds CPU-side vertex and index data
//! - `material` contains colours and surface materials
//! - `sky` is the vertical gradient of the sky dome
//! - `instance` holds per-instance transformation data
//! - `model` contains the uploaded mesh and draw helpers
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `block` mirrors a scene on the GPU (one render block per drawable node)

pub mod block;
pub mod geometry;
pub mod instance;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod sky;
pub mod texture;
