//! plugcfg: inspect a plugin's configuration folder.
//!
//! Operators use this binary to see which configs a plugin has written and to
//! verify that hand-edited files still pass the type-tag allow-list before the
//! plugin is restarted.  It reads `<data-dir>/configs/*.yml` exactly the way
//! the stores in `plugcfg-core` do.
//!
//! # Usage
//!
//! ```text
//! plugcfg [OPTIONS] <COMMAND>
//!
//! Commands:
//!   list                  Print the identifier of every config
//!   show  <ID> [--allow]  Print one config in canonical block layout
//!   check      [--allow]  Validate every config; non-zero exit on failure
//!
//! Options:
//!   --data-dir <DIR>      Plugin data folder [default: .]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable            | Default | Description        |
//! |---------------------|---------|--------------------|
//! | `PLUGCFG_DATA_DIR`  | `.`     | Plugin data folder |
//! | `RUST_LOG`          | `info`  | Log filter         |

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_yaml::Value;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use plugcfg_core::infrastructure::storage;
use plugcfg_core::{DocumentCodec, TypeTagAllowList, YamlCodec};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Inspect and validate plugin configuration files.
#[derive(Debug, Parser)]
#[command(name = "plugcfg", version)]
struct Cli {
    /// Plugin data folder; configs live in its `configs/` subdirectory.
    #[arg(long, default_value = ".", env = "PLUGCFG_DATA_DIR")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the identifier of every config, one per line.
    List,
    /// Decode one config and print it in canonical block layout.
    Show {
        /// Config identifier (file name without `.yml`).
        id: String,
        #[command(flatten)]
        tags: TagArgs,
    },
    /// Decode every config and report which ones fail.
    Check {
        #[command(flatten)]
        tags: TagArgs,
    },
}

#[derive(Debug, Args)]
struct TagArgs {
    /// Type tag the owning plugin declares for the config (its root tag).
    #[arg(long)]
    type_tag: Option<String>,

    /// Additional type tag to accept; repeat for several.
    #[arg(long = "allow", value_name = "TAG")]
    allow: Vec<String>,
}

impl TagArgs {
    /// The root tag used when none is given: the untyped YAML value itself.
    fn target(&self) -> &str {
        self.type_tag
            .as_deref()
            .unwrap_or(std::any::type_name::<Value>())
    }

    fn allow_list(&self) -> TypeTagAllowList {
        TypeTagAllowList::for_target(self.target(), &self.allow)
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn configs_dir(data_dir: &Path) -> anyhow::Result<PathBuf> {
    let dir = data_dir.join(storage::CONFIGS_DIR_NAME);
    if !dir.is_dir() {
        bail!("no configuration directory at {}", dir.display());
    }
    Ok(dir)
}

fn list(data_dir: &Path) -> anyhow::Result<BTreeSet<String>> {
    let dir = configs_dir(data_dir)?;
    Ok(storage::list_config_names(&dir, YamlCodec.extension()))
}

fn decode(path: &Path, tags: &TagArgs) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let value = YamlCodec
        .decode(&text, tags.target(), &tags.allow_list())
        .with_context(|| format!("cannot decode {}", path.display()))?;
    Ok(value)
}

fn show(data_dir: &Path, id: &str, tags: &TagArgs) -> anyhow::Result<String> {
    storage::validate_config_id(id)?;
    let dir = configs_dir(data_dir)?;
    let path = storage::config_file_path(&dir, id, YamlCodec.extension());
    let value = decode(&path, tags)?;
    Ok(YamlCodec.encode(&value)?)
}

/// Outcome of `check` for a single config.
#[derive(Debug)]
struct CheckResult {
    id: String,
    error: Option<String>,
}

fn check(data_dir: &Path, tags: &TagArgs) -> anyhow::Result<Vec<CheckResult>> {
    let dir = configs_dir(data_dir)?;
    let results = storage::list_config_files(&dir, YamlCodec.extension())
        .into_iter()
        .map(|path| {
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let error = decode(&path, tags).err().map(|e| format!("{e:#}"));
            if let Some(e) = &error {
                warn!(config = %id, "validation failed: {e}");
            } else {
                debug!(config = %id, "validation passed");
            }
            CheckResult { id, error }
        })
        .collect();
    Ok(results)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    // Log to stderr so command output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = std::io::stdout().lock();

    match &cli.command {
        Command::List => {
            for name in list(&cli.data_dir)? {
                writeln!(out, "{name}")?;
            }
        }
        Command::Show { id, tags } => {
            write!(out, "{}", show(&cli.data_dir, id, tags)?)?;
        }
        Command::Check { tags } => {
            let results = check(&cli.data_dir, tags)?;
            let failed = results.iter().filter(|r| r.error.is_some()).count();
            for result in &results {
                match &result.error {
                    None => writeln!(out, "ok    {}", result.id)?,
                    Some(e) => writeln!(out, "FAIL  {}: {e}", result.id)?,
                }
            }
            if failed > 0 {
                bail!("{failed} of {} configs failed validation", results.len());
            }
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
