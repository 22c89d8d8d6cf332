pub mod memory;
pub mod traits;

pub use memory::MemoryConfigStore;
pub use traits::{ConfigStore, StoreError, StoreErrorKind};
