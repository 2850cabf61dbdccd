pub mod advisor;
pub mod chat;
pub mod config;
pub mod crops;
pub mod engine;
pub mod farm;
pub mod game;
pub mod notifications;
pub mod rng;
pub mod systems;
pub mod weather;
pub mod web;

pub use config::{FarmConfig, FarmConfigLoader};
pub use engine::{DaySummary, Engine, EngineBuilder};
pub use farm::{FarmError, FarmSnapshot, FarmState};
pub use game::{Game, GameError};
