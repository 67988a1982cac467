//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (the model artifact format).

mod classifier;

pub use classifier::{check_row, Classifier, ClassifierError};
