use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use colored::Colorize;
use serde_json::Value;
use stash_state::{bind, ErrorCallback, StorageAreas};
use stash_store::{StorageConfig, StorageError, StorageKey, StorageProvider};

use crate::cli::*;

/// Configuration file picked up from the working directory.
const DEFAULT_CONFIG_FILE: &str = "stash.toml";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    tracing::debug!(path = %config.path.display(), "using storage file");
    let areas = StorageAreas::from_config(&config);
    let local = areas.local();

    match cli.command {
        Command::Get(args) => cmd_get(local, args, cli.format),
        Command::Set(args) => cmd_set(local, args, cli.format),
        Command::Incr(args) => cmd_incr(local, args, cli.format),
        Command::List => cmd_list(local, cli.format),
        Command::Remove(args) => cmd_remove(local, args),
        Command::Clear => cmd_clear(local),
        Command::Usage => cmd_usage(local, &config, cli.format),
    }
}

pub fn resolve_config(cli: &Cli) -> anyhow::Result<StorageConfig> {
    let mut config = match &cli.config {
        Some(path) => StorageConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => StorageConfig::load(DEFAULT_CONFIG_FILE)?,
        None => StorageConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.path = store.clone();
    }
    Ok(config)
}

/// Error callback that keeps the first storage failure for later reporting.
fn capture_errors() -> (Arc<Mutex<Option<String>>>, ErrorCallback) {
    let slot = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&slot);
    let callback: ErrorCallback = Arc::new(move |e: &StorageError| {
        if let Ok(mut first) = sink.lock() {
            first.get_or_insert_with(|| e.to_string());
        }
    });
    (slot, callback)
}

fn take_error(slot: &Mutex<Option<String>>) -> Option<String> {
    slot.lock().ok().and_then(|mut e| e.take())
}

fn render(value: &Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => value.to_string(),
        OutputFormat::Text => match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        },
    }
}

fn cmd_get(local: &StorageProvider, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = StorageKey::new(&args.key)?;
    let default = match args.default {
        Some(text) => serde_json::from_str(&text).context("--default is not valid JSON")?,
        None => Value::Null,
    };
    let (value, _) = bind::<Value>(local.clone(), key, default.into(), None);
    println!("{}", render(&value, format));
    Ok(())
}

fn cmd_set(local: &StorageProvider, args: SetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = StorageKey::new(&args.key)?;
    let next: Value = serde_json::from_str(&args.value)
        .with_context(|| format!("value for {:?} is not valid JSON", args.key))?;

    let (errors, on_error) = capture_errors();
    let (_, set) = bind::<Value>(local.clone(), key.clone(), Value::Null.into(), Some(on_error));
    set.set_value(next);

    if let Some(e) = take_error(&errors) {
        anyhow::bail!("could not store {}: {e}", key);
    }
    match format {
        OutputFormat::Json => println!("{}", set.current()),
        OutputFormat::Text => println!("{} {} = {}", "✓".green().bold(), key.as_str().yellow(), render(&set.current(), format)),
    }
    Ok(())
}

fn cmd_incr(local: &StorageProvider, args: IncrArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = StorageKey::new(&args.key)?;
    let by = args.by;

    // A binding would treat a non-integer item as absent and overwrite it.
    if let Some(raw) = local.backend()?.get_item(&key)? {
        if serde_json::from_str::<i64>(&raw).is_err() {
            anyhow::bail!("{} holds {raw}, which is not an integer", key);
        }
    }

    let (errors, on_error) = capture_errors();
    let (before, set) = bind::<i64>(local.clone(), key.clone(), 0.into(), Some(on_error));
    set.update(|n| n.saturating_add(by));

    if let Some(e) = take_error(&errors) {
        anyhow::bail!("could not store {}: {e}", key);
    }
    let after = set.current();
    match format {
        OutputFormat::Json => println!("{after}"),
        OutputFormat::Text => println!("{} {} {} → {}", "✓".green().bold(), key.as_str().yellow(), before, after.to_string().bold()),
    }
    Ok(())
}

fn cmd_list(local: &StorageProvider, format: OutputFormat) -> anyhow::Result<()> {
    let backend = local.backend()?;
    let keys = backend.keys()?;

    match format {
        OutputFormat::Json => {
            let mut object = serde_json::Map::new();
            for key in keys {
                if let Some(raw) = backend.get_item(&key)? {
                    let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                    object.insert(key, value);
                }
            }
            println!("{}", Value::Object(object));
        }
        OutputFormat::Text => {
            if keys.is_empty() {
                println!("No items stored.");
            }
            for key in keys {
                if let Some(raw) = backend.get_item(&key)? {
                    println!("{} = {}", key.yellow(), raw);
                }
            }
        }
    }
    Ok(())
}

fn cmd_remove(local: &StorageProvider, args: RemoveArgs) -> anyhow::Result<()> {
    let backend = local.backend()?;
    if backend.remove_item(&args.key)? {
        println!("{} Removed {}.", "✓".green(), args.key.yellow());
    } else {
        println!("No item named {}.", args.key.yellow());
    }
    Ok(())
}

fn cmd_clear(local: &StorageProvider) -> anyhow::Result<()> {
    let backend = local.backend()?;
    let count = backend.len()?;
    backend.clear()?;
    println!("{} Cleared {} item(s).", "✓".green(), count);
    Ok(())
}

fn cmd_usage(local: &StorageProvider, config: &StorageConfig, format: OutputFormat) -> anyhow::Result<()> {
    let backend = local.backend()?;
    let items = backend.len()?;
    let used = backend.usage_bytes()?;

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "path": config.path.display().to_string(),
                "items": items,
                "bytes": used,
                "quota": config.local_quota(),
            });
            println!("{report}");
        }
        OutputFormat::Text => {
            println!("Storage: {}", config.path.display().to_string().bold());
            println!("  Items: {}", items);
            match config.local_quota() {
                Some(quota) => println!("  Bytes: {} of {}", used, quota),
                None => println!("  Bytes: {} (no quota)", used),
            }
        }
    }
    Ok(())
}
