// src/infra/paths.rs — Config path resolution
//
// ARBOR_HOME overrides everything. Otherwise config lives in ~/.arbor/.

use std::path::PathBuf;

/// Returns the ARBOR_HOME override, if set.
fn arbor_home() -> Option<PathBuf> {
    std::env::var_os("ARBOR_HOME").map(PathBuf::from)
}

/// Configuration directory: $ARBOR_HOME/ or ~/.arbor/
pub fn config_dir() -> Option<PathBuf> {
    if let Some(home) = arbor_home() {
        return Some(home);
    }
    dirs_home().map(|home| home.join(".arbor"))
}

/// Home directory, if the platform exposes one.
pub fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}
