pub mod manager;
pub mod model;
pub mod reconcile;
pub mod scanner;

pub use manager::{GameDirStatus, InstanceEdit, InstanceManager};
pub use model::{is_plain_file_name, InstalledMod, Instance, LoaderType, ModEntry, UNKNOWN_VERSION};
