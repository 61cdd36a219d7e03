pub mod transcriber;
pub mod transcript;
