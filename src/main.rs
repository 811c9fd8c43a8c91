use clap::{Args, Parser, Subcommand};
use colored::*;
use core::error::Error;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use comment_wrapper_lib::config::{self as cw_config, ConfigLoader, Contributions, LoadedConfig};
use comment_wrapper_lib::exit_codes::exit;
use comment_wrapper_lib::{CommentFormatResolver, CommentWrapper, LanguageRegistry};

mod file_processor;
mod formatter;
mod watch;

use file_processor::WrapMode;

#[derive(Parser)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Control colored output: auto, always, never
    #[arg(long, global = true, default_value = "auto", value_parser = ["auto", "always", "never"])]
    color: String,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ignore all configuration files and use built-in defaults
    #[arg(long, global = true)]
    no_config: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reflow comments in files
    Wrap(WrapArgs),
    /// Keep comments reflowed while files change
    Watch(WrapArgs),
    /// List the languages whose comment syntax is known
    Languages(LanguageArgs),
    /// Show the effective configuration
    Config,
    /// Print the JSON schema of the configuration file
    Schema,
    /// Create a default .comment-wrapper.toml
    Init,
}

#[derive(Args, Debug)]
struct WrapArgs {
    /// Files or directories to reflow (use '-' for stdin)
    #[arg(required = false)]
    paths: Vec<String>,

    /// Target maximum column count, overriding the configuration
    #[arg(short = 'w', long, allow_negative_numbers = true)]
    line_width: Option<i64>,

    /// Treat every file as this language id
    #[arg(short, long)]
    language: Option<String>,

    /// Extra directory of editor extensions to read language definitions from
    #[arg(long = "extension-dir")]
    extension_dirs: Vec<PathBuf>,

    /// Show a diff instead of rewriting files
    #[arg(long, conflicts_with = "check")]
    diff: bool,

    /// Exit with 1 if any file would change, without rewriting anything
    #[arg(long)]
    check: bool,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct LanguageArgs {
    /// Extra directory of editor extensions to read language definitions from
    #[arg(long = "extension-dir")]
    extension_dirs: Vec<PathBuf>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();
}

fn load_config_or_exit(loader: &ConfigLoader) -> LoadedConfig {
    match loader.load() {
        Ok(loaded) => {
            if let Some(path) = &loaded.path {
                log::debug!("Using configuration from {}", path.display());
            }
            loaded
        }
        Err(e) => {
            eprintln!("{}: {}", "Config error".red().bold(), e);
            exit::tool_error();
        }
    }
}

fn build_registry(config: &cw_config::Config, extra_dirs: &[PathBuf]) -> LanguageRegistry {
    let mut roots = config.resolved_extension_dirs();
    roots.extend(extra_dirs.iter().cloned());
    if roots.is_empty() {
        log::warn!("No extension directories found; no language definitions are available");
    }
    LanguageRegistry::scan(roots)
}

fn build_wrapper(loader: &ConfigLoader, config: &cw_config::Config, extra_dirs: &[PathBuf]) -> CommentWrapper {
    let registry = build_registry(config, extra_dirs);
    CommentWrapper::new(
        CommentFormatResolver::new(registry),
        Contributions::new(Box::new(loader.clone())),
    )
}

fn run_wrap(cli_loader: ConfigLoader, args: WrapArgs) -> Result<(), Box<dyn Error>> {
    let loader = cli_loader.with_line_width(args.line_width);
    let config = load_config_or_exit(&loader).config;
    let mut wrapper = build_wrapper(&loader, &config, &args.extension_dirs);

    let mode = if args.check {
        WrapMode::Check
    } else if args.diff {
        WrapMode::Diff
    } else {
        WrapMode::Write
    };

    if args.paths.iter().any(|p| p == "-") {
        let Some(language_id) = args.language.as_deref() else {
            eprintln!("{}: --language is required when reading from stdin", "Error".red().bold());
            exit::tool_error();
        };
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        let wrapped = file_processor::wrap_text(&mut wrapper, language_id, &content)?;
        match mode {
            WrapMode::Write => io::stdout().write_all(wrapped.text.as_bytes())?,
            WrapMode::Diff => println!("{}", formatter::generate_diff(&content, &wrapped.text, "<stdin>")),
            WrapMode::Check => {}
        }
        if mode == WrapMode::Check && wrapped.changed {
            exit::changes_needed();
        }
        return Ok(());
    }

    let files = file_processor::find_source_files(&args.paths, &config.exclude_set());
    let mut changed_files = 0;
    let mut errors = 0;

    for path in &files {
        let Some(language_id) = file_processor::language_for_path(
            path,
            args.language.as_deref(),
            &config,
            wrapper.resolver().registry(),
        ) else {
            log::debug!("Skipping {}: unknown language", path.display());
            continue;
        };

        match file_processor::process_file(&mut wrapper, path, &language_id, mode, args.quiet) {
            Ok(outcome) if outcome.changed => changed_files += 1,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                errors += 1;
            }
        }
    }

    if !args.quiet && mode != WrapMode::Diff {
        let verb = if mode == WrapMode::Check { "would be wrapped" } else { "wrapped" };
        println!("{changed_files} of {} files {verb}", files.len());
    }

    if errors > 0 {
        exit::tool_error();
    }
    if mode == WrapMode::Check && changed_files > 0 {
        exit::changes_needed();
    }
    Ok(())
}

fn run_watch(cli_loader: ConfigLoader, args: WrapArgs) {
    let loader = cli_loader.with_line_width(args.line_width);
    let config = load_config_or_exit(&loader).config;
    let mut wrapper = build_wrapper(&loader, &config, &args.extension_dirs);
    watch::run_watch_mode(
        &mut wrapper,
        &loader,
        config,
        &args.paths,
        args.language.as_deref(),
        args.quiet,
    );
}

fn run_languages(loader: ConfigLoader, args: LanguageArgs) {
    let config = load_config_or_exit(&loader).config;
    let registry = build_registry(&config, &args.extension_dirs);
    let language_ids: Vec<String> = registry.language_ids().map(str::to_string).collect();
    let mut resolver = CommentFormatResolver::new(registry);

    if language_ids.is_empty() {
        println!("No languages found");
        return;
    }

    for language_id in language_ids {
        let (line, block) = match resolver.comment_config(&language_id) {
            Some(comments) => (
                comments
                    .line_comment
                    .map(|c| c.tokens().join(" "))
                    .unwrap_or_else(|| "-".to_string()),
                comments
                    .block_comment
                    .map(|(start, end)| format!("{start} {end}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            None => ("?".dimmed().to_string(), "?".dimmed().to_string()),
        };
        println!("{:<24} {:<12} {}", language_id.cyan(), line, block);
    }
}

fn run_config(loader: ConfigLoader) -> Result<(), Box<dyn Error>> {
    let loaded = load_config_or_exit(&loader);
    match &loaded.path {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# No configuration file found, using defaults"),
    }
    let mut config = loaded.config;
    if config.line_width.is_none() {
        config.line_width = Some(cw_config::DEFAULT_LINE_WIDTH as i64);
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn run_schema() -> Result<(), Box<dyn Error>> {
    let schema = schemars::schema_for!(cw_config::Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_init() {
    let path = Path::new(".comment-wrapper.toml");
    match cw_config::create_default_config(path) {
        Ok(()) => println!("Created default configuration file: {}", path.display()),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            exit::tool_error();
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Reset SIGPIPE to default behavior on Unix so piping to `head` etc. works correctly.
    #[cfg(unix)]
    {
        // SAFETY: restoring the default SIGPIPE disposition has no other side effects.
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.color.as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::unset_override(),
    }

    let loader = ConfigLoader::new(cli.config, cli.no_config);

    match cli.command {
        Commands::Wrap(args) => run_wrap(loader, args)?,
        Commands::Watch(args) => run_watch(loader, args),
        Commands::Languages(args) => run_languages(loader, args),
        Commands::Config => run_config(loader)?,
        Commands::Schema => run_schema()?,
        Commands::Init => run_init(),
    }
    Ok(())
}
