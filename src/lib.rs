pub mod checkpoints;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs;
pub mod git;
pub mod models;
pub mod plan;
pub mod scheduler;
pub mod verify;
