// Quiz sessions: the state machine, its in-memory store, the async flow that
// issues provider requests at the right transitions, and the HTTP handlers.

pub mod flow;
pub mod handlers;
pub mod machine;
pub mod store;
pub mod view;
