pub mod config;
pub mod db;
pub mod migrate;
pub mod migrations;
pub mod model;
pub mod observability;
pub mod usage;
