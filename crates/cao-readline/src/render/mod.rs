//! Terminal output: display-width wrapping and bordered panels.

pub mod panel;
pub mod wrap;

pub use panel::PanelRenderer;
