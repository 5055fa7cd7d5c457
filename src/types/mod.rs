//! Core types for genaiclient.

pub mod generation;
pub mod message;
pub mod prompt;
pub mod records;

pub use generation::*;
pub use message::*;
pub use prompt::*;
pub use records::*;
