//! Named asset store and compressed pack format.
//!
//! Assets are addressed by resource name (a path relative to the asset
//! root, always with `/` separators). The first load of a name reads and
//! decodes the file; later loads hit the cache. A store can be written out
//! as a pack and reopened without touching the filesystem.
//!
//! # Layout
//! Pack: `WGPK` magic, `u32` LE format version, SHA-256 of the body, then
//! the body: zstd-compressed CBOR of the name table, images and blobs.

mod bundle;
mod pack;
mod store;

pub use bundle::{BundleKind, bundle_folder};
pub use pack::{PACK_MAGIC, PACK_VERSION};
pub use store::{AssetStore, Generic, Image, normalize_name};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {name}: {reason}")]
    ImageDecode { name: String, reason: String },
    #[error("script {name} rejected: {reason}")]
    ScriptRejected { name: String, reason: String },
    #[error("not an asset pack (bad magic)")]
    BadMagic,
    #[error("unsupported pack version {0}")]
    UnsupportedVersion(u32),
    #[error("pack integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("pack encode error: {0}")]
    Encode(String),
    #[error("pack decode error: {0}")]
    Decode(String),
    #[error("JSON error in {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("asset {0} is not loaded")]
    NotLoaded(String),
}

pub fn crate_info() -> &'static str {
    "woodgas-assets v0.1.0"
}
