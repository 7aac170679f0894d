// Data models for pose landmarks, exercise sessions, and safety grading

pub mod exercise;
pub mod pose;
pub mod safety;
