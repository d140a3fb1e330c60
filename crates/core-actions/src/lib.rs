//! Modal key dispatch: the mode machine, the action set, command execution,
//! and the external collaborators (git, clipboard, formatter, language
//! server) the editor talks to.

mod action;
pub mod collab;
mod dispatcher;
pub mod io_ops;

pub use action::{Action, Motion};
pub use collab::{Clipboard, CollabError, Collaborators, Formatter, LanguageClient, Vcs};
pub use dispatcher::{
    BranchPicker, CommandError, CommandParser, DispatchResult, Dispatcher, Options, ParsedCommand,
    Pending,
};
