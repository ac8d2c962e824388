//! Video End-Frame Generator
//!
//! This library provides the core functionality for the end-frame-gen
//! service: users upload still images ("start frames"), each one is sent to a
//! Gemini image model to synthesize the matching "end frame" of a short clip,
//! and the paired results are offered for download. Jobs live in memory and
//! are processed strictly one at a time.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
