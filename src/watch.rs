//! Watch mode: keep comments wrapped while files change
//!
//! The watcher doubles as the host's notification plumbing: configuration
//! edits reload the line width, and changes under the extension directories
//! rebuild the language map.

use crate::file_processor::{self, WrapMode};
use colored::*;
use comment_wrapper_lib::config::{CONFIG_FILES, Config, ConfigLoader};
use comment_wrapper_lib::{CommentWrapper, LanguageRegistry};
use globset::GlobSet;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

/// What a batch of file system events amounts to
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Changes {
    pub configuration: bool,
    pub languages: bool,
    pub language_configuration: bool,
    pub source_files: BTreeSet<PathBuf>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        !self.configuration && !self.languages && self.source_files.is_empty()
    }
}

/// Classify one event and fold it into `changes`.
pub fn record_event(event: &Event, registry: &LanguageRegistry, changes: &mut Changes) {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }

    for path in &event.paths {
        if registry.roots().iter().any(|root| path.starts_with(root)) {
            changes.languages = true;
            if registry.is_configuration_file(path) {
                changes.language_configuration = true;
            }
            continue;
        }

        if let Some(file_name) = path.file_name().and_then(|n| n.to_str())
            && CONFIG_FILES.contains(&file_name)
        {
            changes.configuration = true;
            continue;
        }

        if path.is_file() {
            changes.source_files.insert(path.clone());
        }
    }
}

/// Changed source files that are not excluded, relative patterns resolved against `base`.
pub fn files_to_wrap<'a>(changes: &'a Changes, exclude: &GlobSet, base: Option<&Path>) -> Vec<&'a PathBuf> {
    changes
        .source_files
        .iter()
        .filter(|path| !file_processor::is_excluded(path, exclude, base))
        .collect()
}

/// Run until interrupted, re-wrapping changed files.
pub fn run_watch_mode(
    wrapper: &mut CommentWrapper,
    loader: &ConfigLoader,
    mut config: Config,
    paths: &[String],
    forced_language: Option<&str>,
    quiet: bool,
) {
    let (tx, rx) = channel();

    let mut watcher = match RecommendedWatcher::new(
        tx,
        NotifyConfig::default().with_poll_interval(Duration::from_millis(500)),
    ) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("{}: Failed to create file watcher: {}", "Error".red().bold(), e);
            crate::exit::tool_error();
        }
    };

    let watch_paths = if paths.is_empty() {
        vec![".".to_string()]
    } else {
        paths.to_vec()
    };
    for path_str in &watch_paths {
        if let Err(e) = watcher.watch(Path::new(path_str), RecursiveMode::Recursive) {
            eprintln!("{}: Failed to watch {}: {}", "Warning".yellow().bold(), path_str, e);
        }
    }

    let extension_roots: Vec<PathBuf> = wrapper.resolver().registry().roots().to_vec();
    for root in &extension_roots {
        if let Err(e) = watcher.watch(root, RecursiveMode::Recursive) {
            log::warn!("Failed to watch extension directory {}: {e}", root.display());
        }
    }

    if let Some(config_path) = loader.locate()
        && let Err(e) = watcher.watch(&config_path, RecursiveMode::NonRecursive)
    {
        eprintln!("{}: Failed to watch config file: {}", "Warning".yellow().bold(), e);
    }

    println!("{}", "Watching for file changes... Press Ctrl-C to exit".cyan());

    let debounce_duration = Duration::from_millis(100);
    let base = std::env::current_dir().ok();

    loop {
        let first_event = match rx.recv() {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => {
                log::warn!("Watch error: {e}");
                continue;
            }
            Err(_) => break,
        };

        let mut changes = Changes::default();
        record_event(&first_event, wrapper.resolver().registry(), &mut changes);

        // Collect all events that occur within the debounce window
        let start = Instant::now();
        while start.elapsed() < debounce_duration {
            if let Ok(Ok(event)) = rx.recv_timeout(Duration::from_millis(10)) {
                record_event(&event, wrapper.resolver().registry(), &mut changes);
            }
        }

        if changes.is_empty() {
            continue;
        }

        if changes.configuration {
            wrapper.on_configuration_changed();
            match loader.load() {
                Ok(loaded) => config = loaded.config,
                Err(e) => eprintln!("{}: {}", "Config error".red().bold(), e),
            }
            if !quiet {
                println!("Configuration reloaded (line width {})", wrapper.line_width());
            }
        }

        if changes.languages {
            wrapper.on_languages_changed();
            if changes.language_configuration {
                wrapper.resolver_mut().clear_cache();
            }
            if !quiet {
                println!("Language definitions reloaded");
            }
        }

        let exclude = config.exclude_set();
        for path in files_to_wrap(&changes, &exclude, base.as_deref()) {
            let Some(language_id) =
                file_processor::language_for_path(path, forced_language, &config, wrapper.resolver().registry())
            else {
                continue;
            };
            if let Err(e) = file_processor::process_file(wrapper, path, &language_id, WrapMode::Write, quiet) {
                eprintln!("{}: {}", "Error".red().bold(), e);
            }
        }
    }
}
