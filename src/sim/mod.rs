pub mod event;
pub mod level;
pub mod motion;
pub mod step;
pub mod world;
