use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use gapit_struct_decode::{catalog, Architecture, Schema, SchemaDef};

const DEFAULT_ARCH: &str = "x86_64";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "gapit-decode",
    version,
    about = "Decode packed records out of raw memory captured from a graphics API trace."
)]
pub struct Args {
    /// Memory observed at an address, as `<ADDR>=<PATH>` (repeatable; later images win on overlap)
    #[arg(long = "image", value_name = "ADDR=PATH", value_parser = parse_image)]
    images: Vec<(u64, PathBuf)>,

    /// Captured process ABI: a preset (x86, x86_64, armv7a, arm64) or a `.json` descriptor file
    ///
    /// Environment variable: `GAPIT_ARCH`.
    #[arg(long, env = "GAPIT_ARCH")]
    arch: Option<String>,

    /// JSON schema file describing the record
    #[arg(long, value_name = "PATH", conflicts_with = "builtin")]
    schema: Option<PathBuf>,

    /// Name of a built-in schema (see --list-builtins)
    #[arg(long, value_name = "NAME")]
    builtin: Option<String>,

    /// Address of the record (hex with 0x prefix, or decimal)
    #[arg(long, value_name = "ADDR", value_parser = parse_addr)]
    offset: Option<u64>,

    /// JSON schema file for an array of records referenced by the decoded record
    #[arg(long, value_name = "PATH", conflicts_with = "entries_builtin")]
    entries_schema: Option<PathBuf>,

    /// Built-in schema for an array of records referenced by the decoded record
    #[arg(long, value_name = "NAME")]
    entries_builtin: Option<String>,

    /// Field of the decoded record holding the array length
    #[arg(long, value_name = "FIELD")]
    count_field: Option<String>,

    /// Field of the decoded record holding the array address
    #[arg(long, value_name = "FIELD")]
    pointer_field: Option<String>,

    /// Print the built-in schemas and exit
    #[arg(long, action = clap::ArgAction::SetTrue)]
    list_builtins: bool,

    /// Log filter (tracing-subscriber EnvFilter syntax); logs go to stderr
    ///
    /// Environment variable: `GAPIT_LOG_LEVEL`.
    #[arg(long, env = "GAPIT_LOG_LEVEL")]
    log_level: Option<String>,
}

/// Array of records hanging off the decoded record.
#[derive(Debug, Clone)]
pub struct EntriesConfig {
    pub schema: Schema,
    pub count_field: String,
    pub pointer_field: String,
}

#[derive(Debug, Clone)]
pub enum Mode {
    ListBuiltins,
    Decode {
        schema: Schema,
        offset: u64,
        entries: Option<EntriesConfig>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub arch: Architecture,
    pub images: Vec<(u64, PathBuf)>,
    pub mode: Mode,
    pub log_level: String,
}

impl Args {
    /// Log filter, falling back to `warn` when unset or blank.
    fn log_level(&self) -> String {
        self.log_level
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        let log_level = args.log_level();
        let arch = load_arch(args.arch.as_deref().unwrap_or(DEFAULT_ARCH))?;

        let mode = if args.list_builtins {
            Mode::ListBuiltins
        } else {
            let schema = load_schema(args.schema.as_deref(), args.builtin.as_deref())?
                .ok_or_else(|| anyhow!("one of --schema or --builtin is required"))?;
            let offset = args
                .offset
                .ok_or_else(|| anyhow!("--offset is required when decoding"))?;
            if args.images.is_empty() {
                bail!("at least one --image is required when decoding");
            }

            let entries = load_schema(args.entries_schema.as_deref(), args.entries_builtin.as_deref())?
                .map(|schema| -> Result<EntriesConfig> {
                    let count_field = args
                        .count_field
                        .clone()
                        .ok_or_else(|| anyhow!("--count-field is required with an entries schema"))?;
                    let pointer_field = args.pointer_field.clone().ok_or_else(|| {
                        anyhow!("--pointer-field is required with an entries schema")
                    })?;
                    Ok(EntriesConfig {
                        schema,
                        count_field,
                        pointer_field,
                    })
                })
                .transpose()?;

            Mode::Decode {
                schema,
                offset,
                entries,
            }
        };

        Ok(Self {
            arch,
            images: args.images,
            mode,
            log_level,
        })
    }
}

fn load_arch(value: &str) -> Result<Architecture> {
    if value.ends_with(".json") {
        let text = fs::read_to_string(value)
            .with_context(|| format!("read architecture descriptor {value}"))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("parse architecture descriptor {value}"));
    }
    Ok(value.parse()?)
}

fn load_schema(path: Option<&Path>, builtin: Option<&str>) -> Result<Option<Schema>> {
    if let Some(path) = path {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read schema {}", path.display()))?;
        let def: SchemaDef = serde_json::from_str(&text)
            .with_context(|| format!("parse schema {}", path.display()))?;
        let schema =
            Schema::try_from(def).with_context(|| format!("invalid schema {}", path.display()))?;
        return Ok(Some(schema));
    }
    if let Some(name) = builtin {
        let schema = catalog::lookup(name).ok_or_else(|| {
            anyhow!(
                "unknown built-in schema `{name}` (known: {})",
                catalog::names().join(", ")
            )
        })?;
        return Ok(Some(schema));
    }
    Ok(None)
}

fn parse_addr(value: &str) -> Result<u64, String> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => value.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid address `{value}`: {e}"))
}

fn parse_image(value: &str) -> Result<(u64, PathBuf), String> {
    let (addr, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected <ADDR>=<PATH>, got `{value}`"))?;
    if path.is_empty() {
        return Err(format!("missing path in `{value}`"));
    }
    Ok((parse_addr(addr)?, PathBuf::from(path)))
}
