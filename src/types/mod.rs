//! Client Types
//!
//! Core type definitions shared by flows, pipeline and server.

pub mod callback;
pub mod config;
pub mod device;
pub mod token;

pub use callback::*;
pub use config::*;
pub use device::*;
pub use token::*;
