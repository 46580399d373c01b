pub mod error;
pub mod events;
pub mod media;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod repo;
pub mod service;
