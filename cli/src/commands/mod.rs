pub mod configuration;
pub mod db;
pub mod graph;
pub mod ingest;
pub mod patents;
