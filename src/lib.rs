//! Bootstrap for the places database: provisions the application user,
//! creates the places collection and seeds it with sample points of interest.

pub mod bootstrap;
pub mod config;
pub mod db_mongo;
pub mod error;
pub mod geo;
pub mod sample_data;
pub mod verification;
