pub mod compat;
pub mod installer;
pub mod modrinth;
pub mod registry;

pub use compat::{Compatibility, Incompatibility, MatchedRelease};
pub use installer::{InstallOutcome, ModInstaller};
pub use modrinth::{ModrinthClient, MODRINTH_API_BASE};
pub use registry::{ModRegistry, SearchHit};
