#![forbid(unsafe_code)]

mod config;

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use gapit_struct_decode::{
    catalog, decode, Architecture, CaptureMemory, DecodedRecord, FieldDef, RecordArray, Schema,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::{Args, Config, EntriesConfig, Mode};

#[derive(Debug, Serialize)]
struct DecodeReport {
    schema: String,
    arch: Architecture,
    base: String,
    record: DecodedRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<EntriesReport>,
}

#[derive(Debug, Serialize)]
struct EntriesReport {
    schema: String,
    base: String,
    stride: u64,
    records: Vec<DecodedRecord>,
}

#[derive(Debug, Serialize)]
struct BuiltinReport {
    name: String,
    stride: u64,
    fields: Vec<FieldDef>,
}

fn main() -> Result<()> {
    let config = Config::from_args(Args::parse())?;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    tracing::debug!(arch = %config.arch, images = config.images.len(), "configuration loaded");

    let out = match &config.mode {
        Mode::ListBuiltins => serde_json::to_string_pretty(&list_builtins(&config.arch)?)?,
        Mode::Decode {
            schema,
            offset,
            entries,
        } => {
            let memory = load_images(&config)?;
            let report = run_decode(&config.arch, &memory, schema, *offset, entries.as_ref())?;
            serde_json::to_string_pretty(&report)?
        }
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{out}")?;
    Ok(())
}

fn list_builtins(arch: &Architecture) -> Result<Vec<BuiltinReport>> {
    catalog::names()
        .iter()
        .map(|name| {
            let schema = catalog::lookup(name)
                .with_context(|| format!("built-in schema {name} is not registered"))?;
            Ok(BuiltinReport {
                name: schema.name().to_string(),
                stride: schema.stride(Some(arch))?,
                fields: schema.to_def().fields,
            })
        })
        .collect()
}

fn load_images(config: &Config) -> Result<CaptureMemory> {
    let mut memory = CaptureMemory::new();
    for (addr, path) in &config.images {
        let bytes = fs::read(path).with_context(|| format!("read image {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            base = format_args!("0x{addr:x}"),
            len = bytes.len(),
            "loaded memory image"
        );
        memory
            .observe(*addr, &bytes)
            .with_context(|| format!("map image {} at 0x{addr:x}", path.display()))?;
    }
    Ok(memory)
}

fn run_decode(
    arch: &Architecture,
    memory: &CaptureMemory,
    schema: &Schema,
    offset: u64,
    entries: Option<&EntriesConfig>,
) -> Result<DecodeReport> {
    let record = decode(Some(arch), schema, offset, memory)
        .with_context(|| format!("decode {} at 0x{offset:x}", schema.name()))?;

    let entries = match entries {
        Some(cfg) => {
            let array = RecordArray::from_header(
                &record,
                &cfg.count_field,
                &cfg.pointer_field,
                cfg.schema.clone(),
                Some(arch),
            )
            .with_context(|| format!("locate {} array", cfg.schema.name()))?;
            let records = array
                .decode_all(memory)
                .with_context(|| format!("decode {} array", cfg.schema.name()))?;
            Some(EntriesReport {
                schema: cfg.schema.name().to_string(),
                base: format!("0x{:x}", array.base()),
                stride: array.stride(),
                records,
            })
        }
        None => None,
    };

    Ok(DecodeReport {
        schema: schema.name().to_string(),
        arch: *arch,
        base: format!("0x{offset:x}"),
        record,
        entries,
    })
}
