pub mod manifest;

pub use manifest::{VersionEntry, VersionManifest, VERSION_MANIFEST_URL};
