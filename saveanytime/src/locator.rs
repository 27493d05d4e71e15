use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

pub const EXE_NAME: &str = "Cyberpunk2077.exe";

/// Default Steam library location of the game.
pub const DEFAULT_STEAM_DIR: &str = "C:/Program Files (x86)/Steam/steamapps/common/Cyberpunk 2077";

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("Could not find {exe_name} at {}", path.display())]
    NotFound { exe_name: String, path: PathBuf },
}

/// What the caller should do to obtain the executable path.
#[derive(Debug, PartialEq, Eq)]
pub enum Target {
    /// Path was given and resolved.
    Exe(PathBuf),
    /// No path given but the default install exists. Needs confirmation before use.
    ConfirmDefault(PathBuf),
    /// No path given and nothing at the default install directory.
    NoDefault,
}

#[derive(Debug, Clone)]
pub struct LocatorConfig {
    pub default_install_dir: PathBuf,
    pub exe_name: String,
    /// Location of the executable relative to the install directory.
    pub exe_subdir: PathBuf,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            default_install_dir: DEFAULT_STEAM_DIR.into(),
            exe_name: EXE_NAME.to_string(),
            exe_subdir: ["bin", "x64"].iter().collect(),
        }
    }
}

impl LocatorConfig {
    pub fn default_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_install_dir = dir.into();
        self
    }

    pub fn find_default(&self) -> Option<PathBuf> {
        if !self.default_install_dir.exists() {
            return None;
        }
        let exe_path = self
            .default_install_dir
            .join(&self.exe_subdir)
            .join(&self.exe_name);
        exe_path.exists().then_some(exe_path)
    }

    /// Where the executable should be for a user supplied `path`, without checking it exists.
    pub fn candidate(&self, path: &Path) -> PathBuf {
        if path.is_file() && path.file_name() == Some(OsStr::new(&self.exe_name)) {
            path.to_path_buf()
        } else if path.is_dir() {
            path.join(&self.exe_subdir).join(&self.exe_name)
        } else {
            path.join(&self.exe_name)
        }
    }

    pub fn resolve(&self, path: &Path) -> Result<PathBuf, LocateError> {
        let exe_path = self.candidate(path);
        tracing::debug!("resolved {} to {}", path.display(), exe_path.display());
        if exe_path.exists() {
            Ok(exe_path)
        } else {
            Err(LocateError::NotFound {
                exe_name: self.exe_name.clone(),
                path: exe_path,
            })
        }
    }

    pub fn target(&self, path: Option<&Path>) -> Result<Target, LocateError> {
        match path {
            Some(path) => self.resolve(path).map(Target::Exe),
            None => Ok(self
                .find_default()
                .map(Target::ConfirmDefault)
                .unwrap_or(Target::NoDefault)),
        }
    }
}
