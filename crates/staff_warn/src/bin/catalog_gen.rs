//! Command catalog generator
//!
//! Reads a commands dump and a permissions dump exported by server tooling
//! and prints a `commandPermissions.toml` to stdout.
//!
//! # Usage
//!
//! ```bash
//! catalog_gen --commands=commands.json --permissions=permissions.json > commandPermissions.toml
//! ```
//!
//! Progress and warnings go to stderr. Set `RUST_LOG=staff_warn=debug` for
//! more detail.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use staff_warn::catalog::{generate_catalog, render_catalog_toml, CommandRow, PermissionRow};
use staff_warn::error::WarnError;
use tracing::info;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const HELP_TEXT: &str = r#"catalog_gen - Build a StaffWarn command catalog from plugin dumps

USAGE:
    catalog_gen --commands=<PATH> --permissions=<PATH>

OPTIONS:
    --commands=<PATH>      Commands dump (JSON, required)
    --permissions=<PATH>   Permissions dump (JSON, required)
    --version              Print version and exit
    --help                 Print this help text and exit

EXAMPLES:
    catalog_gen --commands=commands.json --permissions=permissions.json
"#;

struct CliArgs {
    commands: Option<PathBuf>,
    permissions: Option<PathBuf>,
}

impl CliArgs {
    fn parse() -> Result<Self, String> {
        let mut commands = None;
        let mut permissions = None;

        for arg in env::args().skip(1) {
            if arg == "--version" {
                println!("catalog_gen {}", VERSION);
                process::exit(0);
            } else if arg == "--help" {
                println!("{}", HELP_TEXT);
                process::exit(0);
            } else if let Some(path) = arg.strip_prefix("--commands=") {
                commands = Some(PathBuf::from(path));
            } else if let Some(path) = arg.strip_prefix("--permissions=") {
                permissions = Some(PathBuf::from(path));
            } else {
                return Err(format!("Unknown argument: {}", arg));
            }
        }

        Ok(CliArgs {
            commands,
            permissions,
        })
    }
}

fn read(path: &Path) -> Result<String, WarnError> {
    fs::read_to_string(path).map_err(|e| {
        WarnError::Io(io::Error::new(
            e.kind(),
            format!("cannot read dump '{}': {}", path.display(), e),
        ))
    })
}

fn run(commands_path: &Path, permissions_path: &Path) -> Result<String, WarnError> {
    let commands = CommandRow::parse_dump(&read(commands_path)?)?;
    let permissions = PermissionRow::parse_dump(&read(permissions_path)?)?;
    info!(
        "Read {} commands and {} permission rows",
        commands.len(),
        permissions.len()
    );

    let catalog = generate_catalog(&commands, &permissions);
    info!("Generated {} catalog entries", catalog.len());
    render_catalog_toml(&catalog)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staff_warn=info,catalog_gen=info".parse().unwrap()),
        )
        .with_writer(io::stderr)
        .init();

    let args = match CliArgs::parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            eprintln!("\nRun 'catalog_gen --help' for usage information.");
            process::exit(1);
        }
    };

    let (Some(commands), Some(permissions)) = (args.commands, args.permissions) else {
        eprintln!("ERROR: Both --commands=<PATH> and --permissions=<PATH> are required");
        eprintln!("\nRun 'catalog_gen --help' for usage information.");
        process::exit(1);
    };

    let rendered = match run(&commands, &permissions) {
        Ok(rendered) => rendered,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            process::exit(1);
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout.write_all(rendered.as_bytes()).and_then(|_| stdout.flush()) {
        if err.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("ERROR: Failed to write catalog: {}", err);
            process::exit(1);
        }
    }
}
