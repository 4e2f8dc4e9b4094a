pub mod memory;
pub mod redis;

pub use memory::MemoryTranscriptStore;
pub use redis::RedisTranscriptStore;
