mod file_blob_store;
mod memory_blob_store;

pub use file_blob_store::{FileSessionBlobStore, DEFAULT_STORAGE_DIR_NAME};
pub use memory_blob_store::InMemorySessionBlobStore;
