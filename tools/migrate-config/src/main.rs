// tools/migrate-config/src/main.rs
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};
use lnd_config::{record, Settings, Version, CATALOGUE, CHAIN};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{value, DocumentMut, Item, Table};

#[derive(Parser, Debug)]
#[command(name = "migrate-config", version, about = "Inspect and migrate the LND package configuration")]
struct Cli {
    /// Settings file (defaults to ./lnd-config.toml)
    #[arg(long, global = true, env = "LND_CONFIG_SETTINGS")]
    settings: Option<PathBuf>,

    /// Record file, overriding `record.path` from the settings
    #[arg(long, global = true)]
    record: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    migrate: MigrateArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the field catalogue as JSON
    Spec,
    /// Write a fresh default record
    Defaults {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check the record against the catalogue and the typed model
    Validate,
    /// Migrate the record between versions (the default)
    Migrate(MigrateArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
struct MigrateArgs {
    /// Version the record is stored at (defaults to `record.version`)
    #[arg(long)]
    from: Option<String>,
    /// Target version (defaults to the current version)
    #[arg(long)]
    to: Option<String>,
    /// Overwrite without asking
    #[arg(long, short = 'y')]
    yes: bool,
    /// Print the migrated record instead of writing it
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    lnd_config::init_logging("info");
    let cli = Cli::parse();

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(lnd_config::settings::DEFAULT_SETTINGS_FILE));
    let settings = Settings::load(Some(settings_path.as_path()))?;
    let record_path = cli.record.clone().unwrap_or(settings.record.path.clone());

    match cli.command {
        Some(Command::Spec) => {
            println!("{}", serde_json::to_string_pretty(&*CATALOGUE)?);
            Ok(())
        }
        Some(Command::Defaults { out }) => {
            let out = out.unwrap_or(record_path);
            write_defaults(&out)?;
            println!("Default configuration written to {}", out.display());
            Ok(())
        }
        Some(Command::Validate) => validate(&record_path),
        Some(Command::Migrate(args)) => migrate(&settings_path, &settings, &record_path, &args),
        None => migrate(&settings_path, &settings, &record_path, &cli.migrate),
    }
}

fn write_defaults(out: &Path) -> Result<()> {
    let defaults = CATALOGUE.default_record(&mut rand::thread_rng());
    record::save(out, &defaults)?;
    Ok(())
}

fn validate(record_path: &Path) -> Result<()> {
    let config = record::load(record_path)?;
    let report = lnd_config::validate(&config);
    if report.is_valid() {
        println!("{}: ok", record_path.display());
        return Ok(());
    }
    for e in &report.errors {
        println!("  {e}");
    }
    if let Some(shape) = &report.shape {
        println!("  shape: {shape}");
    }
    if let Some(model) = &report.model {
        println!("  model: {model}");
    }
    for w in &report.watchtowers {
        println!("  {w}");
    }
    bail!("{} is not a valid configuration", record_path.display())
}

fn migrate(
    settings_path: &Path,
    settings: &Settings,
    record_path: &Path,
    args: &MigrateArgs,
) -> Result<()> {
    let from: Version = args
        .from
        .as_deref()
        .unwrap_or(&settings.record.version)
        .parse()
        .context("invalid --from version")?;
    let to: Version = match args.to.as_deref() {
        Some(s) => s.parse().context("invalid --to version")?,
        None => CHAIN.current().clone(),
    };

    let plan = CHAIN.plan(&from, &to)?;
    if plan.is_empty() {
        println!("Nothing to do: {from} -> {to}");
        return Ok(());
    }
    if let Some(blocked) = plan.blocked_by() {
        bail!("cannot downgrade from {from} to {to}: {blocked} discards configuration data");
    }

    let original = record::load(record_path)?;
    let migrated = CHAIN.migrate(&from, &to, original.clone())?;
    let applied: Vec<String> = migrated.applied.iter().map(ToString::to_string).collect();
    println!("Applied: {}", applied.join(", "));
    if !migrated.configured {
        println!("Review the configuration before starting LND.");
    }

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&migrated.record)?);
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Overwrite {}?", record_path.display()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted, nothing written.");
            return Ok(());
        }
    }

    commit(settings_path, record_path, &original, &migrated.record, &to)?;
    println!(
        "Configuration migrated {from} -> {to} in {}",
        record_path.display()
    );
    Ok(())
}

/// Writes the migrated record and the new stored version together. On any
/// failure the record is left in, or restored to, the layout the stored
/// version names.
fn commit(
    settings_path: &Path,
    record_path: &Path,
    original: &Value,
    migrated: &Value,
    version: &Version,
) -> Result<()> {
    let staged = stage_stored_version(settings_path, version)?;
    swap_in(&staged, settings_path, record_path, original, migrated)?;
    tracing::info!(path = %settings_path.display(), %version, "stored version updated");
    Ok(())
}

fn swap_in(
    staged: &Path,
    settings_path: &Path,
    record_path: &Path,
    original: &Value,
    migrated: &Value,
) -> Result<()> {
    if let Err(e) = record::save(record_path, migrated) {
        let _ = fs::remove_file(staged);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(staged, settings_path) {
        let _ = fs::remove_file(staged);
        record::save(record_path, original).with_context(|| {
            format!(
                "{} was migrated but could not be restored after a failed settings update",
                record_path.display()
            )
        })?;
        return Err(anyhow!("updating {}: {e}", settings_path.display()));
    }
    Ok(())
}

/// Renders the settings document with `record.version` set to `version`,
/// keeping the rest of it as it was, and writes it next to the settings file.
fn stage_stored_version(settings_path: &Path, version: &Version) -> Result<PathBuf> {
    let content = if settings_path.exists() {
        fs::read_to_string(settings_path)
            .with_context(|| format!("reading {}", settings_path.display()))?
    } else {
        String::new()
    };
    let mut doc = content.parse::<DocumentMut>()?;
    let record_table = doc
        .entry("record")
        .or_insert_with(|| Item::Table(Table::new()));
    match record_table {
        Item::Table(table) => {
            table["version"] = value(version.to_string());
            table.fmt();
        }
        _ => bail!("`record` in {} is not a table", settings_path.display()),
    }

    let mut staged = settings_path.as_os_str().to_owned();
    staged.push(".tmp");
    let staged = PathBuf::from(staged);
    if let Err(e) = fs::write(&staged, doc.to_string()) {
        let _ = fs::remove_file(&staged);
        return Err(anyhow!("writing {}: {e}", staged.display()));
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cli_defaults_to_migrate() {
        let cli = Cli::parse_from(["migrate-config", "--from", "0.17.0", "--yes"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.migrate.from.as_deref(), Some("0.17.0"));
        assert!(cli.migrate.yes);

        let cli = Cli::parse_from(["migrate-config", "defaults", "--out", "x.json"]);
        assert!(matches!(cli.command, Some(Command::Defaults { out: Some(_) })));
    }

    #[test]
    fn stored_version_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lnd-config.toml");
        fs::write(
            &path,
            "# node settings\n[record]\npath = \"config.yaml\"\nversion = \"0.17.0\"\n\n[server]\nport = 9090\n",
        )
        .unwrap();

        let staged = stage_stored_version(&path, &"0.20.1".parse().unwrap()).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("0.17.0"));
        fs::rename(&staged, &path).unwrap();
        let out = fs::read_to_string(&path).unwrap();
        assert!(out.starts_with("# node settings\n"));
        assert!(out.contains("version = \"0.20.1\""));
        assert!(out.contains("port = 9090"));
        assert!(!out.contains("0.17.0"));
    }

    #[test]
    fn commit_creates_missing_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lnd-config.toml");
        let record_path = dir.path().join("config.json");
        commit(
            &path,
            &record_path,
            &json!({}),
            &json!({ "alias": "x" }),
            &"0.19.3".parse().unwrap(),
        )
        .unwrap();
        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.record.version, "0.19.3");
        assert_eq!(record::load(&record_path).unwrap(), json!({ "alias": "x" }));
        assert!(!dir.path().join("lnd-config.toml.tmp").exists());
    }

    fn neutrino_record(dir: &Path) -> PathBuf {
        let record_path = dir.join("config.json");
        let mut current = CATALOGUE.default_record(&mut rand::thread_rng());
        current["bitcoind"] = json!({ "type": "none" });
        record::save(&record_path, &current).unwrap();
        record_path
    }

    fn full_upgrade() -> MigrateArgs {
        MigrateArgs {
            from: Some("0.13.0".into()),
            to: Some("0.20.1".into()),
            yes: true,
            ..MigrateArgs::default()
        }
    }

    #[test]
    fn unwritable_settings_leave_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let record_path = neutrino_record(dir.path());
        let before = fs::read_to_string(&record_path).unwrap();
        let settings_path = dir.path().join("no-such-dir").join("lnd-config.toml");
        let settings = Settings::load(Some(settings_path.as_path())).unwrap();

        let err = migrate(&settings_path, &settings, &record_path, &full_upgrade()).unwrap_err();
        assert!(err.to_string().contains("lnd-config.toml.tmp"));
        assert_eq!(fs::read_to_string(&record_path).unwrap(), before);
        assert_eq!(record::load(&record_path).unwrap()["bitcoind"]["type"], "none");
    }

    #[test]
    fn malformed_settings_leave_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let record_path = neutrino_record(dir.path());
        let before = fs::read_to_string(&record_path).unwrap();
        let settings_path = dir.path().join("lnd-config.toml");
        fs::write(&settings_path, "record = \"config.json\"\n").unwrap();
        let settings = Settings::load(Some(dir.path().join("unused.toml").as_path())).unwrap();

        let err = migrate(&settings_path, &settings, &record_path, &full_upgrade()).unwrap_err();
        assert!(err.to_string().contains("not a table"));
        assert_eq!(fs::read_to_string(&record_path).unwrap(), before);
        assert!(!dir.path().join("lnd-config.toml.tmp").exists());
    }

    #[test]
    fn failed_settings_rename_restores_record() {
        let dir = tempfile::tempdir().unwrap();
        let record_path = neutrino_record(dir.path());
        let original = record::load(&record_path).unwrap();
        let mut migrated = original.clone();
        migrated["bitcoind"] = json!({ "type": "internal" });

        // rename cannot replace a non-empty directory
        let settings_path = dir.path().join("settings.d");
        fs::create_dir(&settings_path).unwrap();
        fs::write(settings_path.join("keep"), "x").unwrap();
        let staged = dir.path().join("settings.d.tmp");
        fs::write(&staged, "[record]\nversion = \"0.20.1\"\n").unwrap();

        let err = swap_in(&staged, &settings_path, &record_path, &original, &migrated).unwrap_err();
        assert!(err.to_string().contains("settings.d"));
        assert_eq!(record::load(&record_path).unwrap(), original);
        assert!(!staged.exists());
    }
}
