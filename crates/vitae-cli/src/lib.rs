//! Vitae command-line tools
//!
//! Inspect how a document maps onto a form, move the local cache between
//! machines, compare two copies of a document, and sync one locale with the
//! résumé server.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use vitae_core::{EditorConfig, EditorController, EditorRuntime, HttpRemote, Intent, StatusLevel};
use vitae_form::{DescriptorTree, FieldDescriptor, ItemShape, ListDescriptor, StructureIntrospector};
use vitae_store::{ExportBundle, Locale, Reconciliation, ReconciliationEngine, Resolution, Snapshot};

/// Cache directory used when neither `--dir` nor the config file sets one
pub const DEFAULT_CACHE_DIR: &str = ".vitae";

/// Command-line definition
#[must_use]
pub fn build_cli() -> Command {
    Command::new("vitae")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Schema-less résumé documents: inspection, local cache and sync")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Editor configuration file (TOML)"),
        )
        .arg(
            Arg::new("dir")
                .long("dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Local cache directory"),
        )
        .arg(
            Arg::new("remote")
                .long("remote")
                .global(true)
                .help("Résumé server base URL"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show the form derived from a document")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Document to analyze"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the descriptor tree as JSON"),
                ),
        )
        .subcommand(Command::new("locales").about("List cached locales"))
        .subcommand(
            Command::new("export")
                .about("Write every cached locale to a bundle file")
                .arg(
                    Arg::new("output")
                        .required(true)
                        .help("Bundle file, or '-' for standard output"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Merge a bundle file into the cache")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Bundle file"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Compare two copies of a document")
                .arg(
                    Arg::new("local")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("remote_file")
                        .value_name("REMOTE")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("locale")
                        .long("locale")
                        .default_value("local")
                        .help("Locale named in the report"),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Save a cached locale and compare it with the server copy")
                .arg(Arg::new("locale").required(true).help("Locale code"))
                .arg(
                    Arg::new("resolve")
                        .long("resolve")
                        .value_parser(["push", "pull"])
                        .help("Settle a divergence by pushing local or pulling remote"),
                ),
        )
}

/// Configuration from `--config`, with `--dir` and `--remote` applied on top
///
/// # Errors
/// Returns error if the configuration file cannot be read
pub fn load_config(matches: &ArgMatches) -> Result<EditorConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    if let Some(dir) = matches.get_one::<PathBuf>("dir") {
        config.storage = config.storage.with_directory(dir);
    } else if config.storage.directory.is_none() {
        config.storage = config.storage.with_directory(DEFAULT_CACHE_DIR);
    }
    if let Some(url) = matches.get_one::<String>("remote") {
        config = config.with_remote_url(url);
    }
    Ok(config)
}

/// Run the selected subcommand, writing its report to `out`
///
/// Returns `false` when the command ran but found a problem (divergent
/// documents, failed sync).
///
/// # Errors
/// Returns error if the command could not run
pub async fn execute(matches: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let config = load_config(matches)?;
    match matches.subcommand() {
        Some(("inspect", args)) => inspect(&config, args, out),
        Some(("locales", _)) => locales(&config, out),
        Some(("export", args)) => export(&config, args, out),
        Some(("import", args)) => import(&config, args, out),
        Some(("diff", args)) => diff(&config, args, out),
        Some(("sync", args)) => sync(&config, args, out).await,
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
}

fn read_json(path: &PathBuf) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing <{name}>"))
}

fn inspect(config: &EditorConfig, args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let document = read_json(required_path(args, "file")?)?;
    let tree = StructureIntrospector::new(config.introspection.clone()).analyze(&document)?;

    if args.get_flag("json") {
        writeln!(out, "{}", serde_json::to_string_pretty(&tree)?)?;
    } else {
        render_tree(&tree, out)?;
    }
    Ok(true)
}

fn render_tree(tree: &DescriptorTree, out: &mut dyn Write) -> Result<()> {
    for section in &tree.sections {
        writeln!(out, "{} [{}]", section.title, section.id)?;
        for field in &section.fields {
            render_field(field, "  ", out)?;
        }
        for list in &section.lists {
            render_list(list, "  ", out)?;
        }
        for sub in &section.subsections {
            writeln!(out, "  {} <{}>", sub.title, sub.path)?;
            for field in &sub.fields {
                render_field(field, "    ", out)?;
            }
            for list in &sub.lists {
                render_list(list, "    ", out)?;
            }
        }
    }
    Ok(())
}

fn render_field(field: &FieldDescriptor, indent: &str, out: &mut dyn Write) -> Result<()> {
    let marker = if field.required { " *" } else { "" };
    writeln!(out, "{indent}{} ({}) {}{marker}", field.path, field.label, field.kind)?;
    Ok(())
}

fn render_list(list: &ListDescriptor, indent: &str, out: &mut dyn Write) -> Result<()> {
    let shape = match &list.shape {
        ItemShape::Scalar => "scalar".to_string(),
        ItemShape::Fields(fields) => {
            let keys: Vec<String> = fields
                .iter()
                .map(|f| if f.required { format!("{}*", f.key) } else { f.key.clone() })
                .collect();
            format!("{{{}}}", keys.join(", "))
        }
    };
    writeln!(
        out,
        "{indent}{} ({}) [{} item(s)] {shape}",
        list.path,
        list.label,
        list.items.len()
    )?;
    Ok(())
}

fn locales(config: &EditorConfig, out: &mut dyn Write) -> Result<bool> {
    let store = config.storage.open()?;
    let entries = store.list_locales()?;
    if entries.is_empty() {
        writeln!(out, "no cached locales")?;
    }
    for entry in entries {
        writeln!(out, "{}\t{}", entry.code, entry.label)?;
    }
    Ok(true)
}

fn export(config: &EditorConfig, args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let target = args
        .get_one::<String>("output")
        .context("missing <output>")?;
    let bundle = config.storage.open()?.export_all()?;
    let text = bundle.to_json()?;

    if target == "-" {
        writeln!(out, "{text}")?;
    } else {
        fs::write(target, text).with_context(|| format!("writing {target}"))?;
        writeln!(out, "exported {} locale(s) to {target}", bundle.len())?;
    }
    Ok(true)
}

fn import(config: &EditorConfig, args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let path = required_path(args, "file")?;
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let bundle = ExportBundle::from_json(&text)?;

    let imported = config.storage.open()?.import_all(&bundle)?;
    let codes: Vec<&str> = imported.iter().map(Locale::as_str).collect();
    writeln!(out, "imported {} locale(s): {}", codes.len(), codes.join(", "))?;
    Ok(true)
}

fn diff(config: &EditorConfig, args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let local = read_json(required_path(args, "local")?)?;
    let remote = read_json(required_path(args, "remote_file")?)?;
    let locale: Locale = args
        .get_one::<String>("locale")
        .map_or("local", String::as_str)
        .parse()?;

    let engine = ReconciliationEngine::new(config.reconcile.clone());
    match engine.reconcile(Some(&Snapshot::new(locale, local)), Some(&remote)) {
        Reconciliation::Diverged(conflict) => {
            writeln!(out, "{conflict}")?;
            for path in &conflict.paths {
                writeln!(out, "  {path}")?;
            }
            Ok(false)
        }
        _ => {
            writeln!(out, "in sync")?;
            Ok(true)
        }
    }
}

async fn sync(config: &EditorConfig, args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let locale: Locale = args
        .get_one::<String>("locale")
        .context("missing <locale>")?
        .parse()?;
    let resolution = match args.get_one::<String>("resolve").map(String::as_str) {
        Some("push") => Some(Resolution::PushLocal),
        Some("pull") => Some(Resolution::PullRemote),
        _ => None,
    };

    let remote = HttpRemote::new(&config.remote)?;
    tracing::info!(locale = %locale, remote = remote.base_url(), "Syncing");
    let controller = EditorController::from_config(config)?;
    let mut runtime = EditorRuntime::new(controller, Arc::new(remote));

    let mut steps = vec![Intent::SwitchLocale(locale), Intent::Sync];
    steps.extend(resolution.map(Intent::Resolve));

    let mut ok = true;
    for intent in steps {
        let result = runtime.dispatch(intent);
        runtime.settle().await;
        for message in runtime.controller_mut().drain_status() {
            ok &= message.level != StatusLevel::Danger;
            writeln!(out, "{message}")?;
        }
        if let Err(err) = result {
            writeln!(out, "[error] {err}")?;
            return Ok(false);
        }
        if runtime.controller().session().is_none() {
            return Ok(false);
        }
    }

    if let Some(conflict) = runtime.controller().conflict() {
        writeln!(out, "unresolved: {conflict}")?;
        ok = false;
    }
    Ok(ok)
}
