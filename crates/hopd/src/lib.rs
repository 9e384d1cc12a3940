//! panehop: fan out agent notifications, remember where they came from,
//! and jump back there on click.

pub mod autorun;
pub mod dispatcher;
pub mod error;
pub mod focus;
pub mod handler;
pub mod logging;
pub mod marker_store;
pub mod on_click;
pub mod resolver;
pub mod turn_complete;

#[cfg(test)]
mod scenarios;
#[cfg(test)]
pub(crate) mod testing;

pub use autorun::*;
pub use dispatcher::*;
pub use error::*;
pub use focus::*;
pub use handler::*;
pub use logging::*;
pub use marker_store::*;
pub use on_click::*;
pub use resolver::*;
pub use turn_complete::*;
