//! boxed error type used at the engine lifecycle seams.
//!
//! Send + Sync so errors can cross the thread boundary between the
//! capture collaborator and whoever owns the engine.
pub type BoxError = std::boxed::Box<
    dyn std::error::Error // must implement Error to satisfy ?
        + std::marker::Send // needed for threads
        + std::marker::Sync, // needed for threads
>;
