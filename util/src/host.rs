//! Host platform utility functions

use std::{env, path::PathBuf};

/// Environment variable holding the software root directory.
pub const SW_ROOT_ENV: &str = "PLEN_SW_ROOT";

/// Get the software root directory from the environment.
pub fn get_plen_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV).map(PathBuf::from)
}
