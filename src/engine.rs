//! engine façade and its collaborators
pub mod capture;
pub mod note_engine;
pub mod param_message;
pub mod preprocess;
pub mod stability;
