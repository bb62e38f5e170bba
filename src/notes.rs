//! note identities and frequency-to-note quantization
pub mod note;
pub mod quantizer;
