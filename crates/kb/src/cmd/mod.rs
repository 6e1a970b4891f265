//! Command implementations for the kb CLI

pub mod compile;
pub mod ingest;
pub mod init;
pub mod metrics;
pub mod resolve;
pub mod schema;
