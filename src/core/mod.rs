pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod geometry;
pub mod narration;
pub mod safety;
