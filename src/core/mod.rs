//! Core client logic: persistence, HTTP, session management and REST wrappers

pub mod auth;
pub mod blog;
pub mod config;
pub mod db;
pub mod http;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
