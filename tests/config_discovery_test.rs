/// Configuration discovery relative to the working directory.
///
/// These tests change the process-wide current directory, so they run serially.
use comment_wrapper_lib::config::{ConfigLoader, Contributions};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct CwdGuard(PathBuf);

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let previous = env::current_dir().expect("Failed to read current dir");
        env::set_current_dir(dir).expect("Failed to change current dir");
        Self(previous)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.0);
    }
}

/// ```
/// root/
///   project/
///     .git/
///     .comment-wrapper.toml (line-width = 72)
///     src/nested/
///   user-config/ (empty)
/// ```
fn setup_project() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().canonicalize().expect("Failed to canonicalize temp dir");
    let project = root.join("project");
    fs::create_dir_all(project.join(".git")).expect("Failed to create .git");
    fs::create_dir_all(project.join("src").join("nested")).expect("Failed to create src");
    fs::create_dir_all(root.join("user-config")).expect("Failed to create user config dir");
    fs::write(project.join(".comment-wrapper.toml"), "line-width = 72\n").expect("Failed to write config");
    (temp_dir, root, project)
}

fn loader(root: &Path) -> ConfigLoader {
    ConfigLoader {
        user_config_dir: Some(root.join("user-config")),
        ..ConfigLoader::new(None, false)
    }
}

#[test]
#[serial(cwd)]
fn test_discovers_config_from_nested_cwd() {
    let (_temp_dir, root, project) = setup_project();
    let _guard = CwdGuard::enter(&project.join("src").join("nested"));

    let loaded = loader(&root).load().expect("Failed to load config");
    assert_eq!(loaded.path, Some(project.join(".comment-wrapper.toml")));
    assert_eq!(loaded.config.line_width, Some(72));

    let contributions = Contributions::new(Box::new(loader(&root)));
    assert_eq!(contributions.line_width(), 72);
}

#[test]
#[serial(cwd)]
fn test_search_stops_at_repository_root() {
    let (_temp_dir, root, project) = setup_project();
    fs::write(root.join(".comment-wrapper.toml"), "line-width = 40\n").expect("Failed to write outer config");
    fs::remove_file(project.join(".comment-wrapper.toml")).expect("Failed to remove project config");
    let _guard = CwdGuard::enter(&project.join("src"));

    let loaded = loader(&root).load().expect("Failed to load config");
    assert_eq!(loaded.path, None);
    assert_eq!(loaded.config.line_width, None);
}

#[test]
#[serial(cwd)]
fn test_user_config_used_outside_projects() {
    let (_temp_dir, root, _project) = setup_project();
    let user_dir = root.join("user-config").join("comment-wrapper");
    fs::create_dir_all(&user_dir).expect("Failed to create user config");
    fs::write(user_dir.join("comment-wrapper.toml"), "line-width = 100\n").expect("Failed to write user config");
    let elsewhere = root.join("elsewhere");
    fs::create_dir_all(elsewhere.join(".git")).expect("Failed to create .git");
    let _guard = CwdGuard::enter(&elsewhere);

    let loaded = loader(&root).load().expect("Failed to load config");
    assert_eq!(loaded.path, Some(user_dir.join("comment-wrapper.toml")));
    assert_eq!(loaded.config.line_width, Some(100));
}

#[test]
#[serial(cwd)]
fn test_no_config_ignores_discovered_files() {
    let (_temp_dir, _root, project) = setup_project();
    let _guard = CwdGuard::enter(&project);

    let loaded = ConfigLoader::new(None, true)
        .with_line_width(Some(0))
        .load()
        .expect("Failed to load config");
    assert_eq!(loaded.path, None);

    let contributions = Contributions::new(Box::new(ConfigLoader::new(None, true).with_line_width(Some(0))));
    assert_eq!(contributions.line_width(), 1);
}
