//! # Utilities

pub mod regex;
pub mod unicode;
