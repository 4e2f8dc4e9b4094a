pub mod ingest;
pub mod transcript;
