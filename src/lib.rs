//! Surfmap - incremental spatial surface mesh registry and renderer

pub mod core;
pub mod ingest;
pub mod mesh;
pub mod registry;
pub mod render;
