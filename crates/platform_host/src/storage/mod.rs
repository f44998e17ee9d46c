//! Storage-domain contracts and lightweight test adapters.

mod blob;

pub use blob::{
    load_typed_with, save_typed_with, KvStore, KvStoreFuture, MemoryKvStore, NoopKvStore,
};
