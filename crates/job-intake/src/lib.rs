//! Job application intake service.
//!
//! Accepts application forms with attached documents, stores the documents with a
//! media host, and keeps per-field verification metadata alongside each record.

pub mod applications;
pub mod config;
pub mod error;
pub mod telemetry;
