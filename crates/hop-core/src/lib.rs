pub mod config;
pub mod events;
pub mod process;
pub mod shell;
pub mod slug;
pub mod store;
pub mod types;

pub use config::*;
pub use events::*;
pub use process::*;
pub use shell::*;
pub use slug::*;
pub use store::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::{
        load_config_from, shell_join, slugify, AutorunState, HopConfig, Locator,
        NotificationEvent, ProcessError, StoreError, TurnMarker,
    };
    use std::any::TypeId;

    #[test]
    fn crate_root_reexports_core_types() {
        let _ = TypeId::of::<NotificationEvent>();
        let _ = TypeId::of::<TurnMarker>();
        let _ = TypeId::of::<AutorunState>();
        let _ = TypeId::of::<Locator>();
        let _ = TypeId::of::<HopConfig>();
        let _ = TypeId::of::<ProcessError>();
        let _ = TypeId::of::<StoreError>();
    }

    #[test]
    fn crate_root_reexports_helpers() {
        assert_eq!(slugify("Agent Turn-Complete"), "agent_turn_complete");
        assert_eq!(shell_join(["echo", "a b"]), "'echo' 'a b'");
        let config = load_config_from(None, |_| None);
        assert!(!config.dispatch.enable_autorun);
    }
}
