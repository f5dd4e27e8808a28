//! HTTP Routes

pub mod periodogram;
