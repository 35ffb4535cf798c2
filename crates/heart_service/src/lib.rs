//! Heart Disease Prediction Service
//!
//! Serves single-record predictions from a pre-trained binary classifier
//! over HTTP.

pub mod api;
pub mod commands;
pub mod state;
