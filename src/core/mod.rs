//! Core Components
//!
//! Transport, discovery and state infrastructure shared by every flow.

pub mod discovery;
pub mod form;
pub mod state;
pub mod transport;

pub use discovery::*;
pub use form::*;
pub use state::*;
pub use transport::*;
