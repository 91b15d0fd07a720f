//! shoptrack - storefront backend with email campaigns and click-tracked links
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface (cron `send-batch`, admin bootstrap)
//!
//! # Architecture
//! - `storage`: SeaORM persistence (users, mailing list, short URLs, clicks, OTPs, products)
//! - `services`: Business logic shared by HTTP handlers, CLI and the embedded scheduler
//! - `api`: HTTP services, JWT sessions and middleware
//! - `interfaces`: CLI command implementations
//! - `config`: Static configuration (TOML + `ST__*` env)
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
