mod openrouter;

pub use openrouter::*;
