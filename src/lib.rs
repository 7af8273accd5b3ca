// Watermark Studio library

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod studio;
pub mod transform;
pub mod watermark;
