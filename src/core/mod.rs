pub mod config;
pub mod presenter;
pub mod quake;
pub mod screen;
