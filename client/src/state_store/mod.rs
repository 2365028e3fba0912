mod action;
mod state;
#[allow(clippy::module_inception)]
mod state_store;

pub use action::Action;
pub use state::{BoardData, ServerConnectionStatus, State};
pub use state_store::StateStore;
