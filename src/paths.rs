/// Location of the githound configuration file
///
/// `$GITHOUND_CONFIG` wins; otherwise the file lives under the platform's
/// config directory (XDG on Linux, Application Support on macOS, %APPDATA%
/// on Windows).
use std::path::PathBuf;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "GITHOUND_CONFIG";

const APP_DIR: &str = "githound";
const CONFIG_FILE: &str = "config.toml";

/// Platform config locations
pub struct PlatformPaths;

impl PlatformPaths {
    /// Base config directory; `.` when no relevant variable is set
    pub fn config_dir() -> PathBuf {
        let dir = if cfg!(target_os = "windows") {
            non_empty_var("APPDATA").map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            home_join("Library/Application Support")
        } else {
            non_empty_var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|| home_join(".config"))
        };
        dir.unwrap_or_else(|| PathBuf::from("."))
    }

    /// `{config_dir}/githound`
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR)
    }

    /// `$GITHOUND_CONFIG`, else `{config_dir}/githound/config.toml`
    pub fn default_config_path() -> PathBuf {
        non_empty_var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::project_config_dir().join(CONFIG_FILE))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn home_join(rel: &str) -> Option<PathBuf> {
    non_empty_var("HOME").map(|home| PathBuf::from(home).join(rel))
}
