pub mod model;
pub mod store;

pub use model::{record_name, Manifest, MANAGED_SUBDIR};
pub use store::{LoadStatus, ManifestSession, ManifestStore};
