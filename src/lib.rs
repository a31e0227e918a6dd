pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod matching;
pub mod model;
pub mod overlay;
pub mod text;
