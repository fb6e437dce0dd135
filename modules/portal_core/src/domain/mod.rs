pub mod error;
pub mod events;
pub mod ports;
pub mod repo;
pub mod section;
pub mod service;
