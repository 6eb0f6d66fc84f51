//! Live map of trains running on the Finnish rail network, fed by the
//! Digitraffic rail API.

pub mod api;
pub mod app;
pub mod config;
pub mod console;
pub mod error;
pub mod map;
pub mod refresh;
pub mod state;

pub use self::error::{Error, Result};
