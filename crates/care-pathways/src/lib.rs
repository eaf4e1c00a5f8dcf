//! Deterministic scenario engine for country-level abortion care pathway
//! modelling, plus the workbook import and R export surfaces built on top of it.

pub mod config;
pub mod error;
pub mod scenario;
pub mod telemetry;
pub mod workbook;
