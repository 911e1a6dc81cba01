//! Core library components.
//!
//! This module contains the bootstrap pipeline (resolve, render, provision)
//! and the management operation contract.

pub mod bootstrap;
pub mod component;
pub mod config;
pub mod constants;
pub mod manage;
pub mod render;
pub mod resolver;
pub mod secrets;
pub mod types;
