pub mod archive;
pub mod checksum;
pub mod cleanup;
pub mod commands;
pub mod download;
pub mod http;
pub mod install;
pub mod manifest;
pub mod platform;
pub mod runtime;
pub mod uninstall;
