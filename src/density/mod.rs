//! Density scoring of isoline points and design-event selection.

mod kde;
mod selection;

pub use kde::KernelDensity2d;
pub use selection::{select_events, SelectedEvents};
