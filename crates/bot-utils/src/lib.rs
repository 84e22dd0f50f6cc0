//! Shared utilities for fear-greed-bot
//!
//! This crate provides the ambient pieces every binary in the workspace needs:
//! tracing setup and environment variable loading.

pub mod config;
pub mod logging;

pub use config::{Env, EnvError, load_dotenv};
pub use logging::{LogFormat, init_tracing};
