//! The cooperative pause flag and the menu it triggers (§4.10).
//!
//! The flag itself never touches OS signal delivery — per §1/§4.10 of the
//! expanded design, wiring an actual `SIGINT` (or similar) to a
//! [`PauseHandle`] is a host binary's job. The engine only ever polls it
//! between instructions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply cloneable, shareable flag a caller outside the run loop can
/// set to request a pause at the next instruction boundary.
#[derive(Clone, Debug, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    pub fn new() -> PauseHandle {
        PauseHandle(Arc::new(AtomicBool::new(false)))
    }

    /// Requests a pause. Idempotent.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the request, e.g. after the menu's `resume` command.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Atomically clears the request and reports whether it had been set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// The commands recognized by the pause menu (§4.10).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuCommand {
    Debug,
    Exit,
    Halt,
    Help,
    Resume,
    Save,
    State,
}

impl MenuCommand {
    pub fn parse(line: &str) -> Option<MenuCommand> {
        match line.trim() {
            "debug" => Some(MenuCommand::Debug),
            "exit" => Some(MenuCommand::Exit),
            "halt" => Some(MenuCommand::Halt),
            "help" => Some(MenuCommand::Help),
            "resume" => Some(MenuCommand::Resume),
            "save" => Some(MenuCommand::Save),
            "state" => Some(MenuCommand::State),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_handle_is_not_requested() {
        assert!(!PauseHandle::new().is_requested());
    }

    #[test]
    fn request_is_visible_through_a_clone() {
        let handle = PauseHandle::new();
        let clone = handle.clone();
        clone.request();
        assert!(handle.is_requested());
    }

    #[test]
    fn take_clears_and_reports() {
        let handle = PauseHandle::new();
        handle.request();
        assert!(handle.take());
        assert!(!handle.is_requested());
        assert!(!handle.take());
    }

    #[test]
    fn parses_all_seven_commands() {
        for (text, expected) in [
            ("debug", MenuCommand::Debug),
            ("exit", MenuCommand::Exit),
            ("halt", MenuCommand::Halt),
            ("help", MenuCommand::Help),
            ("resume", MenuCommand::Resume),
            ("save", MenuCommand::Save),
            ("state", MenuCommand::State),
        ] {
            assert_eq!(MenuCommand::parse(text), Some(expected));
        }
    }

    #[test]
    fn unknown_command_is_none() {
        assert_eq!(MenuCommand::parse("frobnicate"), None);
    }
}
