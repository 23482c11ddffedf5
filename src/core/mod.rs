// ─── YAMIM Core ───
// Instance bookkeeping and mod installation for a Minecraft launcher.
//
// Architecture:
//   core/
//     manifest/   config.json model + locked load/save sessions
//     instance/   Instance model, filesystem scan, reconciliation, CRUD
//     mods/       Mod registry client, compatibility check, installer
//     version/    Mojang version manifest (release picker)
//     state/      Launcher settings + shared application state

pub mod error;
pub mod http;
pub mod instance;
pub mod manifest;
pub mod mods;
pub mod state;
pub mod version;

#[cfg(test)]
mod test_support;
