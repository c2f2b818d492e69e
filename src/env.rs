//! Installation and runtime environment discovery.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the installation root.
pub const SERVER_HOME: &str = "SERVER_HOME";

/// Environment variable naming the default runtime home.
pub const JAVA_HOME: &str = "JAVA_HOME";

/// Locates the installation root and the default runtime home for a launch.
///
/// The descriptor only records paths; existence checks happen when the
/// command builder resolves the runtime executable.
#[derive(Debug, Clone)]
pub struct Environment {
    home: PathBuf,
    default_java_home: Option<PathBuf>,
}

impl Environment {
    /// Discover from the process environment: `SERVER_HOME` for the root
    /// (the current directory when unset) and `JAVA_HOME` for the runtime.
    pub fn discover() -> Self {
        let home = env::var_os(SERVER_HOME)
            .map(PathBuf::from)
            .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let default_java_home = env::var_os(JAVA_HOME).map(PathBuf::from);
        Self {
            home,
            default_java_home,
        }
    }

    /// An environment rooted at `home` with no default runtime home.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            default_java_home: None,
        }
    }

    pub fn with_java_home(mut self, java_home: impl Into<PathBuf>) -> Self {
        self.default_java_home = Some(java_home.into());
        self
    }

    /// The installation root.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// The runtime home from the process environment, if any.
    pub fn default_java_home(&self) -> Option<&Path> {
        self.default_java_home.as_deref()
    }

    /// Resolve a path under the installation root.
    pub fn resolve_path<I, S>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut path = self.home.clone();
        for part in parts {
            path.push(part);
        }
        path
    }
}

/// Split a whitespace-separated options string. The split is naive:
/// consecutive whitespace collapses and there is no quoting support.
pub fn split_options(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Read and split an options-override variable. Unset means empty.
pub fn options_from_env(var: &str) -> Vec<String> {
    env::var(var)
        .map(|value| split_options(&value))
        .unwrap_or_default()
}
