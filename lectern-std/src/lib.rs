//! # lectern-std
//!
//! Standard implementations for the Lectern route-resolution and
//! hook-dispatch engine.
//!
//! This crate provides:
//! - **Pattern compilation**: [`pattern::compile`]
//! - **Routing**: [`routes::RouteTable`], [`resolver::Resolver`]
//! - **Hooks**: [`hooks::HookRegistry`], [`trigger::Trigger`]
//! - **Dispatch**: [`dispatch::Controller`], [`dispatch::ActionDispatcher`]
//! - **Links**: [`urls::UrlBuilder`]
//! - **Bootstrap**: [`config::EngineConfig`], [`engine::EngineBuilder`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use lectern_core;

// Modules
pub mod config;
pub mod content;
pub mod dispatch;
pub mod engine;
pub mod extension;
pub mod hooks;
pub mod pattern;
pub mod resolver;
pub mod routes;
pub mod testing;
pub mod trigger;
pub mod urls;

#[cfg(feature = "inventory")]
pub use inventory;
