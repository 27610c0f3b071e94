//! A Flappy Bird clone on a fixed 800x600 logical canvas, scaled to fit the
//! terminal and drawn with half-block pixels.

pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod layout;
pub mod logging;
pub mod physics;
pub mod render;

pub use game::{Flow, FrameClock, Game};
pub use physics::{GameState, Pipe, Tuning};
