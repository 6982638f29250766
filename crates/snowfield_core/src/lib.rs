//! Core state machine for the snowfield walking scene: world state, the
//! journey event timeline, and the per-frame scene director. No I/O here;
//! audio and captions are reached through the port traits.

pub mod director;
pub mod noise;
pub mod ports;
pub mod timeline;
pub mod world;
