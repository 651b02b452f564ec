//! S3-compatible blob storage for uploaded attachments (e.g. Cloudflare R2).

pub mod s3;

pub use s3::{object_url, S3BlobStore, StorageConfig};
