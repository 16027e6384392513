#[macro_use]
pub mod vocabulary;

pub mod config;
pub mod db;
pub mod domain;
pub mod http;
pub mod metrics;
pub mod notifications;
pub mod telemetry;
