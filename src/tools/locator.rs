use crate::error::{Result, SuiteError};
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Finds external executables by name
pub trait ToolLocator: Send + Sync {
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// Searches a fixed list of directories, captured from `PATH` at construction
#[derive(Debug, Clone)]
pub struct PathLocator {
    dirs: Vec<PathBuf>,
}

impl PathLocator {
    pub fn from_env() -> Self {
        Self::from_path_var(env::var_os("PATH").unwrap_or_default())
    }

    pub fn from_path_var(path: impl Into<OsString>) -> Self {
        let path = path.into();
        Self {
            dirs: env::split_paths(&path).collect(),
        }
    }
}

impl ToolLocator for PathLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .flat_map(|dir| candidates(dir, name))
            .find(|candidate| is_executable(candidate))
    }
}

/// Fixed name → path table, for tests and pinned deployments
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    tools: HashMap<String, PathBuf>,
}

impl StaticLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.tools.insert(name.into(), path.into());
        self
    }
}

impl ToolLocator for StaticLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.tools.get(name).cloned()
    }
}

/// Executables resolved once at startup
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    tools: HashMap<String, PathBuf>,
}

impl Toolbox {
    /// Resolve every name in `required`, reporting all missing ones together
    pub fn resolve(locator: &dyn ToolLocator, required: &[&str]) -> Result<Self> {
        let mut tools = HashMap::new();
        let mut missing = Vec::new();

        for &name in required {
            match locator.locate(name) {
                Some(path) => {
                    debug!("Resolved {} -> {}", name, path.display());
                    tools.insert(name.to_string(), path);
                }
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(SuiteError::MissingTools(missing));
        }

        if !required.is_empty() {
            info!("External tools resolved: {}", required.join(", "));
        }

        Ok(Self { tools })
    }

    pub fn path(&self, name: &str) -> Result<&Path> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| SuiteError::MissingTools(vec![name.to_string()]))
    }
}

fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let mut out = vec![dir.join(name)];
    if cfg!(windows) {
        out.push(dir.join(format!("{name}.exe")));
    }
    out
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
