//! Domain models for the patient portal.

mod certificate;
mod identity;
mod patient;
mod prescription;
mod study;

pub use certificate::*;
pub use identity::*;
pub use patient::*;
pub use prescription::*;
pub use study::*;
