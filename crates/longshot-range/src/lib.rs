//! Shooting range domain: cameras, terrain, steel targets, gusting wind, the
//! wind flag and the scope with its mil reticle.
//!
//! World axes are metres with +X crossrange to the right, +Y up and -Z
//! downrange. The shooter stands near the origin facing -Z.

pub mod camera;
pub mod config;
pub mod flag;
pub mod noise;
pub mod reticle;
pub mod scene;
pub mod scope;
pub mod target;
pub mod terrain;
pub mod units;
pub mod wind;
