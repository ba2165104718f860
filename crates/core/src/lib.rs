//! Core library: manifest loading, split filtering, fetching, clipping,
//! label export and completeness checks for the MS-ASL clip dataset.

pub mod checker;
pub mod config;
pub mod exporter;
pub mod extractor;
pub mod fetcher;
pub mod manifest;
pub mod models;
pub mod naming;
pub mod pipeline;
pub mod runlog;
pub mod split;

#[cfg(test)]
mod testing;
