pub mod background;
pub mod config;
pub mod repository;
pub mod runtime;
pub mod storage;
pub mod transfer;

pub use background::Background;
pub use config::{ClipmarkConfig, ConfigError, ConfigLoader};
pub use repository::{ClipError, ClipMap, ClipPatch, ClipRepository, NewClip};
pub use runtime::{RuntimeError, TabHandle, TabRuntime};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
pub use transfer::{ClipBundle, ClipCard, ImportPayload, ImportSummary};
