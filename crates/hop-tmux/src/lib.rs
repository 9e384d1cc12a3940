pub mod command;
pub mod discover;
pub mod error;
pub mod mux;
pub mod types;

pub use command::*;
pub use discover::*;
pub use error::*;
pub use mux::*;
pub use types::*;
