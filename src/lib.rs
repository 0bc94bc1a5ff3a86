// src/lib.rs

//! chargewatch: charging-station outlet poller library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
