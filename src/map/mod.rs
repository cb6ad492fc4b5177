pub mod map;
pub mod map_tile;
