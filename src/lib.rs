#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod alliance;
mod board;
mod combat;
mod common;
mod config;
mod coord;
mod events;
mod fleet;
mod game;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod orchestrator;
mod player;
pub mod prelude;
mod reveal;
mod ship;
mod stats;
mod targeting;

pub use alliance::*;
pub use board::*;
pub use combat::*;
pub use common::*;
pub use config::*;
pub use coord::*;
pub use events::*;
pub use fleet::*;
pub use game::*;
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use orchestrator::*;
pub use player::*;
pub use reveal::*;
pub use ship::*;
pub use stats::*;
pub use targeting::*;
