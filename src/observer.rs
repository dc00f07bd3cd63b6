//! Concrete observers (§4.8): a one-shot state dump, and a step tracer
//! that pauses after each instruction to print a snapshot.

use crate::engine::{Machine, Observer};
use crate::serialize;
use log::error;
use std::io::{self, BufRead, Write};

/// Identifies an observer independently of its concrete type, so the
/// pause menu's `debug`/`save` commands can toggle one by name (§4.8,
/// §4.10) without the engine knowing about `synvm`'s console.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObserverTag {
    DumpState,
    Trace,
}

/// Writes the machine's complete state (§4.7) the next time it runs, then
/// detaches itself.
pub struct DumpStateObserver {
    sink: Box<dyn Write>,
}

impl DumpStateObserver {
    pub fn new(sink: Box<dyn Write>) -> DumpStateObserver {
        DumpStateObserver { sink }
    }
}

impl Observer for DumpStateObserver {
    fn tag(&self) -> ObserverTag {
        ObserverTag::DumpState
    }

    fn on_step(&mut self, machine: &mut Machine) -> bool {
        if let Err(err) = serialize::write_state(machine, &mut self.sink) {
            error!("failed to write state dump: {}", err);
        }
        true
    }
}

/// Prints a snapshot of registers, flags, and `ip` after every
/// instruction, and blocks reading one line from `console_in` before
/// letting the next instruction run — a line of exactly `~` requests a
/// pause the same way it does on the `IN` stream (§4.8, §4.10).
pub struct TraceObserver {
    console_in: Box<dyn BufRead>,
    console_out: Box<dyn Write>,
}

impl TraceObserver {
    pub fn new(console_in: Box<dyn BufRead>, console_out: Box<dyn Write>) -> TraceObserver {
        TraceObserver {
            console_in,
            console_out,
        }
    }

    fn print_snapshot(&mut self, machine: &Machine) -> io::Result<()> {
        writeln!(
            self.console_out,
            "ip={} flags={:?} registers={:?}",
            machine.ip().word(),
            machine.flags(),
            machine.registers(),
        )
    }
}

impl Observer for TraceObserver {
    fn tag(&self) -> ObserverTag {
        ObserverTag::Trace
    }

    fn on_step(&mut self, machine: &mut Machine) -> bool {
        if let Err(err) = self.print_snapshot(machine) {
            error!("trace observer failed to print: {}", err);
        }
        let mut line = String::new();
        if let Err(err) = self.console_in.read_line(&mut line) {
            error!("trace observer failed to read: {}", err);
        } else if line.trim() == "~" {
            machine.pause_handle().request();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn dump_state_observer_detaches_after_one_run() {
        let mut machine = Machine::with_io(Cursor::new(Vec::new()), Vec::new());
        machine.load_program(&[0]).unwrap();
        let mut observer = DumpStateObserver::new(Box::new(Vec::new()));
        assert!(observer.on_step(&mut machine));
    }

    #[test]
    fn trace_observer_never_detaches_by_itself() {
        let mut machine = Machine::with_io(Cursor::new(Vec::new()), Vec::new());
        machine.load_program(&[0]).unwrap();
        let mut observer = TraceObserver::new(
            Box::new(Cursor::new(b"\n".to_vec())),
            Box::new(Vec::new()),
        );
        assert!(!observer.on_step(&mut machine));
    }

    #[test]
    fn trace_observer_requests_pause_on_sentinel_line() {
        let mut machine = Machine::with_io(Cursor::new(Vec::new()), Vec::new());
        machine.load_program(&[0]).unwrap();
        let handle = machine.pause_handle();
        let mut observer = TraceObserver::new(
            Box::new(Cursor::new(b"~\n".to_vec())),
            Box::new(Vec::new()),
        );
        observer.on_step(&mut machine);
        assert!(handle.is_requested());
    }

    #[test]
    fn attaching_and_detaching_observers_by_tag() {
        let mut machine = Machine::with_io(Cursor::new(Vec::new()), Vec::new());
        assert!(!machine.has_observer(ObserverTag::DumpState));
        machine.attach_observer(Box::new(DumpStateObserver::new(Box::new(Vec::new()))));
        assert!(machine.has_observer(ObserverTag::DumpState));
        machine.detach_observer(ObserverTag::DumpState);
        assert!(!machine.has_observer(ObserverTag::DumpState));
    }
}
