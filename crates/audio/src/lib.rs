//! Layered ambient audio: a fixed sound set grouped into wind/env/ui mix
//! buckets, a headless voice mixer, and a cpal output engine.

pub mod bank;
pub mod defs;
pub mod engine;
pub mod mix;
pub mod mixer;

pub use bank::{LoadState, SoundData, SoundError};
pub use defs::{MixGroup, SoundKey};
pub use mix::{AudioMix, BREATH_TRACKER};
pub use mixer::{MixUpdate, PlayOpts};
