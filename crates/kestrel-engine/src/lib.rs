//! Kestrel engine crate.
//!
//! A small 2D engine core: a sprite batcher with a wgpu batch renderer,
//! bitmap-font text layout, a frame timer, an error log and a world of game
//! objects, driven by a winit runtime loop.

pub mod batch;
pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod errors;
pub mod logging;
pub mod paint;
pub mod render;
pub mod text;
pub mod texture;
pub mod time;
pub mod window;
pub mod world;
