pub mod graph;
pub mod ingestion;
pub mod patent_service;
