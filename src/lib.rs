//! Location map with place search and a weather widget.

pub mod session;

pub use session::{Backends, Session};
