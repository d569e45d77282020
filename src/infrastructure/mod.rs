//! Infrastructure layer - Cache backends, upstream clients and services

pub mod cache;
pub mod logging;
pub mod services;
pub mod wechat;
