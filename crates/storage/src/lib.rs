//! form-storage
//!
//! Durable storage for rendered form documents: key generation, local
//! staging and upload through a pluggable object store (S3, a local
//! directory, or memory).

pub mod credentials;
pub mod error;
pub mod finalizer;
pub mod keys;
pub mod s3;
pub mod store;

pub use credentials::{CredentialProvider, SessionCredentials, StaticCredentials};
pub use error::{Result, StorageError};
pub use finalizer::{DocumentFinalizer, UploadDescriptor, UploadResult, PDF_CONTENT_TYPE};
pub use keys::{object_key, object_key_now, UNKNOWN_TICKET};
pub use s3::S3ObjectStore;
pub use store::{FileSystemStore, MemoryStore, ObjectStore, StoredObject};
