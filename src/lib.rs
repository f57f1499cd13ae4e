pub mod configuration;
pub mod domain;
pub mod inventory_client;
pub mod report;
pub mod runner;
pub mod telemetry;
