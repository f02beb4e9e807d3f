pub mod engine;
pub mod resolver;

pub use engine::PrefEngine;
pub use resolver::{Resolution, Resolver};
