mod atomic_io;
mod session;
mod store;

pub use session::{
    InventorySnapshot, Session, SessionError, Settings, INVENTORY_KEY, SETTINGS_KEY,
    SNAPSHOT_VERSION,
};
pub use store::{BlobStore, FileBlobStore, MemoryBlobStore, StoreError};
