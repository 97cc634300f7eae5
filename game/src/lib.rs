pub mod catalog;
pub mod game;
pub mod geometry;
pub mod grid;
pub mod host;
pub mod input;
pub mod physics;
pub mod piece;
pub mod playtest;
pub mod render;
pub mod session;
pub mod settings;
pub mod sfx;
pub mod view;
