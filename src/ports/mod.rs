//! Port traits the domain depends on; implementations live in
//! [`crate::adapters`].

pub mod archive_port;
pub mod config_port;
pub mod data_port;
