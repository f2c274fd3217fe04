pub mod boundary;
pub mod geometry;
pub mod interaction;
pub mod projection;
pub mod world_map;

pub use interaction::{MapController, MapEvent, MapInputs};
pub use world_map::WorldMap;
