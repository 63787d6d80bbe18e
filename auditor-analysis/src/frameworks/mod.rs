//! Project-level framework detection.

pub mod detector;

pub use detector::{detect_frameworks, FrameworkSignal};
