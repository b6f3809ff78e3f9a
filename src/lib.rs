//! Workout session tracking: an active-session store with sets, rest timers
//! and rest presets, an in-memory workout service, and a progression
//! heuristic.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod db;
pub mod debounce;
pub mod models;
pub mod progression;
pub mod rest_timer;
pub mod service;
pub mod storage;
pub mod store;
pub mod types;
pub mod utils;
