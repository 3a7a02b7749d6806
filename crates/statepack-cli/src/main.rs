mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_PACKAGE_ERROR};
use statepack_core::PathOverrides;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "statepack",
    version,
    about = "Deterministic state migration packages and extension command contracts"
)]
struct Cli {
    /// Repository root or any directory inside it.
    #[arg(long, default_value = ".", global = true)]
    repo: String,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export a migration package from the manifest's file selection.
    Export {
        /// Package output directory.
        #[arg(long)]
        out: PathBuf,
        /// Migration manifest (defaults to the configured path).
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Write the package manifest only, without payload files.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Replace the output directory if it is not empty.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Verify a package's payload against its manifest.
    Check {
        /// Package directory.
        #[arg(long)]
        package: PathBuf,
        /// Report problems as warnings and exit 0.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Import a package's payload into a target tree.
    Import {
        /// Package directory.
        #[arg(long = "in", value_name = "DIR")]
        package: PathBuf,
        /// Target tree root.
        #[arg(long, default_value = ".")]
        target: PathBuf,
        /// Show planned writes without touching the target.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Overwrite files that already exist in the target.
        #[arg(long, default_value_t = false)]
        allow_overwrite: bool,
    },
    /// Migrate extension manifests to the namespaced command contract.
    Migrate {
        /// Extensions directory (defaults to the configured path).
        #[arg(long)]
        extensions_dir: Option<PathBuf>,
        /// Contract policy file (defaults to the configured path).
        #[arg(long)]
        contract_policy: Option<PathBuf>,
        /// Apply migrations in place.
        #[arg(long, default_value_t = false)]
        write: bool,
    },
    /// Check extension manifests and the files they reference.
    ExtensionCheck {
        /// Extensions directory (defaults to the configured path).
        #[arg(long)]
        extensions_dir: Option<PathBuf>,
        /// Exit non-zero when issues are found.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Validate the sync policy, migration manifest, contract policy and extensions.
    ContractsCheck {
        /// Sync policy file.
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Migration manifest file.
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Contract policy file.
        #[arg(long)]
        contract_policy: Option<PathBuf>,
        /// Extensions directory.
        #[arg(long)]
        extensions_dir: Option<PathBuf>,
        /// Exit non-zero when issues are found.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("STATEPACK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let repo = expand_tilde(&cli.repo);
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Export {
            out,
            manifest,
            dry_run,
            force,
        } => commands::export::run(
            &repo,
            &out,
            PathOverrides {
                manifest,
                ..PathOverrides::default()
            },
            dry_run,
            force,
            json_output,
        ),
        Commands::Check { package, dry_run } => {
            commands::check::run(&package, dry_run, json_output)
        }
        Commands::Import {
            package,
            target,
            dry_run,
            allow_overwrite,
        } => commands::import::run(&package, &target, dry_run, allow_overwrite, json_output),
        Commands::Migrate {
            extensions_dir,
            contract_policy,
            write,
        } => commands::migrate::run(
            &repo,
            PathOverrides {
                extensions_dir,
                contract_policy,
                ..PathOverrides::default()
            },
            write,
            json_output,
        ),
        Commands::ExtensionCheck {
            extensions_dir,
            strict,
        } => commands::extension_check::run(
            &repo,
            PathOverrides {
                extensions_dir,
                ..PathOverrides::default()
            },
            strict,
            json_output,
        ),
        Commands::ContractsCheck {
            policy,
            manifest,
            contract_policy,
            extensions_dir,
            strict,
        } => commands::contracts_check::run(
            &repo,
            PathOverrides {
                manifest,
                policy,
                contract_policy,
                extensions_dir,
            },
            strict,
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.contains("schema error:") {
        EXIT_MANIFEST_ERROR
    } else if msg.starts_with("package error:") {
        EXIT_PACKAGE_ERROR
    } else {
        EXIT_FAILURE
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
