pub mod effect;
pub mod grid;
pub mod status;
pub mod tile;

#[cfg(test)]
pub mod fixtures;
