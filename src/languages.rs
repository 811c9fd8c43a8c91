//! Discovery of installed language definitions.
//!
//! Language definitions live in editor extension directories. Each extension
//! has a `package.json` manifest whose `contributes.languages` entries name a
//! language id, an optional `language-configuration.json` (relative to the
//! extension directory), and the file extensions and file names it claims.
//!
//! [`LanguageRegistry`] is rebuilt from scratch whenever the set of installed
//! extensions changes. It never reads the language configuration files
//! themselves; that is the resolver's job.

use crate::utils::jsonc;
use etcetera::{BaseStrategy, choose_base_strategy};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Deserialize)]
struct ExtensionManifest {
    #[serde(default)]
    contributes: Option<Contributes>,
}

#[derive(Debug, Default, Deserialize)]
struct Contributes {
    #[serde(default)]
    languages: Vec<LanguageContribution>,
}

#[derive(Debug, Deserialize)]
struct LanguageContribution {
    id: String,
    configuration: Option<String>,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    filenames: Vec<String>,
}

/// Errors raised while reading an extension manifest
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read extension manifest at {path}: {source}")]
    IoError { source: io::Error, path: String },

    #[error("Failed to parse extension manifest at {path}: {source}")]
    ParseError { source: serde_json::Error, path: String },
}

/// Map from language id to its language configuration file, plus the file
/// extension and file name associations used to infer a file's language.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    roots: Vec<PathBuf>,
    configuration_paths: BTreeMap<String, PathBuf>,
    extensions: HashMap<String, String>,
    filenames: HashMap<String, String>,
}

impl LanguageRegistry {
    /// Create an empty registry over `roots` without scanning them.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            ..Default::default()
        }
    }

    /// Create a registry over `roots` and scan them immediately.
    pub fn scan(roots: Vec<PathBuf>) -> Self {
        let mut registry = Self::new(roots);
        registry.rebuild();
        registry
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Clear every mapping and repopulate from the extension roots.
    ///
    /// A root may itself be an extension (it has a `package.json`) or a
    /// directory of extensions. Extensions are visited in path order; a later
    /// extension overrides an earlier one for the same language id.
    pub fn rebuild(&mut self) {
        self.configuration_paths.clear();
        self.extensions.clear();
        self.filenames.clear();

        let roots = self.roots.clone();
        for root in &roots {
            if root.join(MANIFEST_FILE).is_file() {
                self.load_extension(root);
                continue;
            }

            let mut extension_dirs: Vec<PathBuf> = match fs::read_dir(root) {
                Ok(entries) => entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.join(MANIFEST_FILE).is_file())
                    .collect(),
                Err(e) => {
                    log::debug!("[languages] Skipping extension root {}: {e}", root.display());
                    continue;
                }
            };
            extension_dirs.sort();

            for dir in &extension_dirs {
                self.load_extension(dir);
            }
        }

        log::debug!(
            "[languages] Registered {} language configurations from {} roots",
            self.configuration_paths.len(),
            self.roots.len()
        );
    }

    fn load_extension(&mut self, dir: &Path) {
        match read_manifest(&dir.join(MANIFEST_FILE)) {
            Ok(manifest) => {
                let languages = manifest.contributes.unwrap_or_default().languages;
                for language in languages {
                    self.register_contribution(dir, language);
                }
            }
            Err(e) => log::warn!("{e}"),
        }
    }

    fn register_contribution(&mut self, extension_dir: &Path, language: LanguageContribution) {
        for extension in &language.extensions {
            self.extensions
                .insert(normalize_extension(extension), language.id.clone());
        }
        for filename in &language.filenames {
            self.filenames.insert(filename.clone(), language.id.clone());
        }
        if let Some(configuration) = &language.configuration {
            self.configuration_paths
                .insert(language.id, extension_dir.join(configuration));
        }
    }

    /// Register (or replace) the configuration file for `language_id` by hand.
    pub fn register(&mut self, language_id: impl Into<String>, configuration_path: impl Into<PathBuf>) {
        self.configuration_paths
            .insert(language_id.into(), configuration_path.into());
    }

    /// Associate a file extension (with or without the leading dot) with a language.
    pub fn register_extension(&mut self, extension: &str, language_id: impl Into<String>) {
        self.extensions
            .insert(normalize_extension(extension), language_id.into());
    }

    pub fn configuration_path(&self, language_id: &str) -> Option<&Path> {
        self.configuration_paths.get(language_id).map(PathBuf::as_path)
    }

    /// Language ids with a registered configuration file, sorted.
    pub fn language_ids(&self) -> impl Iterator<Item = &str> {
        self.configuration_paths.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.configuration_paths.is_empty()
    }

    /// Infer the language of `path` from its file name, then its extension.
    pub fn language_for_path(&self, path: &Path) -> Option<&str> {
        let file_name = path.file_name()?.to_str()?;
        if let Some(id) = self.filenames.get(file_name) {
            return Some(id);
        }
        let extension = path.extension()?.to_str()?;
        self.extensions.get(&normalize_extension(extension)).map(String::as_str)
    }

    /// True if `path` is a language configuration file known to this registry.
    pub fn is_configuration_file(&self, path: &Path) -> bool {
        self.configuration_paths.values().any(|p| p == path)
    }
}

fn read_manifest(path: &Path) -> Result<ExtensionManifest, RegistryError> {
    let content = fs::read_to_string(path).map_err(|e| RegistryError::IoError {
        source: e,
        path: path.display().to_string(),
    })?;
    jsonc::from_str(&content).map_err(|e| RegistryError::ParseError {
        source: e,
        path: path.display().to_string(),
    })
}

fn normalize_extension(extension: &str) -> String {
    format!(".{}", extension.trim_start_matches('.').to_lowercase())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };
    match choose_base_strategy() {
        Ok(strategy) => strategy.home_dir().join(rest.trim_start_matches(['/', '\\'])),
        Err(e) => {
            log::debug!("[languages] Failed to determine home directory: {e}");
            PathBuf::from(path)
        }
    }
}

/// Extension directories of common VS Code distributions that exist on this machine.
///
/// Built-in language packs come first so that user-installed extensions can
/// override them.
pub fn default_extension_dirs() -> Vec<PathBuf> {
    const BUILTIN_DIRS: &[&str] = &[
        "/usr/share/code/resources/app/extensions",
        "/usr/lib/code/extensions",
        "/opt/visual-studio-code/resources/app/extensions",
        "/Applications/Visual Studio Code.app/Contents/Resources/app/extensions",
    ];
    const USER_DIRS: &[&str] = &["~/.vscode/extensions", "~/.vscode-oss/extensions", "~/.cursor/extensions"];

    BUILTIN_DIRS
        .iter()
        .map(PathBuf::from)
        .chain(USER_DIRS.iter().map(|dir| expand_home(dir)))
        .filter(|dir| dir.is_dir())
        .collect()
}
