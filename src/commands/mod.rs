//! CLI command layer: thin orchestration over the action types, plus the
//! user-facing output.

pub mod check;
pub mod config;
pub mod install;
pub mod list;
pub mod show;
pub mod uninstall;
pub mod upgrade;
