pub mod commands;
pub mod executor;
pub mod memory;
pub mod scripts;

pub use executor::{DocumentStore, RedisStore, decode_plan_response};
pub use memory::MemoryStore;
