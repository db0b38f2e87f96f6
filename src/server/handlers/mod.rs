//! HTTP handlers for the server.

pub mod editor;
pub mod export;
pub mod layers;
pub mod render;
