pub mod mailbox;
pub mod state;

pub use mailbox::Mailbox;
pub use state::{RunState, SkipReason, Termination, TurnState, UpdateKind};
