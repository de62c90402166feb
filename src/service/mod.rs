pub mod generator;

pub use generator::{GenerateRequest, GenerationReport, generate, run};
