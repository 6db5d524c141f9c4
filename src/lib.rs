//! Insolvency document extraction for Romanian Legea 85/2014 procedures.
//!
//! Page images go to a vision model; its loosely shaped JSON is normalized
//! into a total [`schema::ExtractionResult`], matched against known companies
//! and aggregated per case.

pub mod api;
pub mod case;
pub mod coerce;
pub mod company;
pub mod config;
pub mod extractor;
pub mod matching;
pub mod normalize;
pub mod prompt;
pub mod schema;
pub mod vision;
