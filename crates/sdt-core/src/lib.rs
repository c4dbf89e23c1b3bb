//! sdt-core: watch captured network exchanges, classify downloadable media
//! resources, aggregate detections, and synthesize downloader command lines.

pub mod config;
pub mod logging;

pub mod aggregate;
pub mod classify;
pub mod command;
pub mod descriptor;
pub mod exchange;
pub mod har;
pub mod host;
pub mod rules;
pub mod session;
pub mod store;
