/// Client-side mirror of the authoritative room state and the async loop driving it
pub mod state_store;
/// The rendering seam between the synchronized state and whatever draws pixels
pub mod surface;
/// Application interrupt plumbing
pub mod termination;

pub use termination::{create_termination, Interrupted, Terminator};
