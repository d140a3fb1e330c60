//! Undo / redo dispatch.

use core_state::StepError;

use super::Dispatcher;

impl Dispatcher {
    pub(super) fn undo(&mut self) {
        let r = self.journal.undo(&mut self.buf);
        self.after_step(r, "undo");
    }

    pub(super) fn redo(&mut self) {
        let r = self.journal.redo(&mut self.buf);
        self.after_step(r, "redo");
    }

    fn after_step(&mut self, r: Result<(), StepError>, what: &str) {
        self.modes.select_mode = false;
        match r {
            Ok(()) => {}
            Err(StepError::Empty) => self.status.set(format!("nothing to {what}")),
            Err(StepError::Failed) => self.status.set(format!("{what} failed")),
        }
    }
}
