use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::warn;

use crate::core::instance::Instance;

/// Name of the folder under the game directory that holds every instance.
pub const MANAGED_SUBDIR: &str = "YAMIM";

/// Root persisted object (`config.json`).
///
/// Instance records are read one by one: a record that doesn't fit
/// [`Instance`] is kept in `unreadable` and written back unchanged.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(from = "ManifestFile")]
pub struct Manifest {
    /// Game directory that owns the managed root. `null` when unconfigured.
    pub game_dir: Option<PathBuf>,
    pub instances: Vec<Instance>,
    pub unreadable: Vec<Value>,
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestFile {
    #[serde(default)]
    game_dir: Option<PathBuf>,
    #[serde(default)]
    instances: Vec<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<ManifestFile> for Manifest {
    fn from(file: ManifestFile) -> Self {
        let mut instances = Vec::with_capacity(file.instances.len());
        let mut unreadable = Vec::new();

        for raw in file.instances {
            match Instance::deserialize(&raw) {
                Ok(instance) => instances.push(instance),
                Err(err) => {
                    warn!(
                        "Keeping unreadable instance record {:?} as-is: {}",
                        record_name(&raw).unwrap_or("<unnamed>"),
                        err
                    );
                    unreadable.push(raw);
                }
            }
        }

        Self {
            game_dir: file.game_dir,
            instances,
            unreadable,
            extra: file.extra,
        }
    }
}

impl Serialize for Manifest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            game_dir: &'a Option<PathBuf>,
            instances: Records<'a>,
            #[serde(flatten)]
            extra: &'a Map<String, Value>,
        }

        Wire {
            game_dir: &self.game_dir,
            instances: Records {
                parsed: &self.instances,
                raw: &self.unreadable,
            },
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}

struct Records<'a> {
    parsed: &'a [Instance],
    raw: &'a [Value],
}

impl Serialize for Records<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.parsed.len() + self.raw.len()))?;
        for instance in self.parsed {
            seq.serialize_element(instance)?;
        }
        for raw in self.raw {
            seq.serialize_element(raw)?;
        }
        seq.end()
    }
}

/// `name` of a raw instance record, when it is a string.
pub fn record_name(raw: &Value) -> Option<&str> {
    raw.get("name").and_then(Value::as_str)
}

impl Manifest {
    /// `<gameDir>/YAMIM`, if a game directory is configured.
    pub fn managed_root(&self) -> Option<PathBuf> {
        self.game_dir.as_ref().map(|dir| dir.join(MANAGED_SUBDIR))
    }

    /// The game directory, only when it exists on disk.
    pub fn existing_game_dir(&self) -> Option<&PathBuf> {
        self.game_dir.as_ref().filter(|dir| dir.is_dir())
    }

    /// Whether any record, readable or not, claims `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.instances.iter().any(|instance| instance.name == name)
            || self
                .unreadable
                .iter()
                .any(|raw| record_name(raw) == Some(name))
    }

    pub fn find_instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|instance| instance.name == name)
    }

    pub fn find_instance_mut(&mut self, name: &str) -> Option<&mut Instance> {
        self.instances.iter_mut().find(|instance| instance.name == name)
    }

    /// Remove the instance named `name`, returning it.
    pub fn remove_instance(&mut self, name: &str) -> Option<Instance> {
        let index = self
            .instances
            .iter()
            .position(|instance| instance.name == name)?;
        Some(self.instances.remove(index))
    }
}
