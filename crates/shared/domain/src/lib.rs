//! # Domain Models
//!
//! This crate contains pure configuration types and shared constants with a single
//! dependency (`serde`). Keep it lean: no I/O or evaluation logic, just data.

pub mod config;
pub mod constants;
