use std::io::Write;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use dobj_engine::{DataObjectEngine, Payload};
use dobj_server::{AppState, DataObjectServer, ServiceConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve(args) => {
            if let Some(bind) = args.bind {
                config.server.bind_addr = bind;
            }
            cmd_serve(config)
        }
        command => {
            if matches!(command, Command::Publish(_)) {
                require_signing_key(&config)?;
            }
            let state = AppState::from_config(&config)?;
            let stdout = std::io::stdout();
            execute(state.engine(), command, cli.format, &mut stdout.lock())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServiceConfig> {
    match path {
        Some(path) => Ok(ServiceConfig::load(path)?),
        None => Ok(ServiceConfig::default()),
    }
}

/// Links minted with a per-process random key can never be verified by a
/// server, so publishing from the CLI needs a configured key.
fn require_signing_key(config: &ServiceConfig) -> anyhow::Result<()> {
    if config.links.signing_key.is_none() {
        tracing::warn!("links.signing_key is not set; refusing to publish");
        anyhow::bail!(
            "publish needs links.signing_key in the configuration so that `dobj serve` can verify the link"
        );
    }
    Ok(())
}

fn cmd_serve(config: ServiceConfig) -> anyhow::Result<()> {
    let server = DataObjectServer::from_config(config)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

/// Run one engine-backed command, writing its output to `out`.
pub fn execute(
    engine: &DataObjectEngine,
    command: Command,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Create(args) => {
            let payload = payload(args.input)?;
            engine.create(&args.uri, payload)?;
            report(out, format, "Created", &args.uri)
        }
        Command::Update(args) => {
            let payload = payload(args.input)?;
            engine.update(&args.uri, payload)?;
            report(out, format, "Updated", &args.uri)
        }
        Command::Read(args) => {
            let data = engine.read(&args.uri)?;
            match args.output {
                Some(path) => {
                    std::fs::write(&path, &data)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    report(out, format, "Wrote", &path.display().to_string())
                }
                None => Ok(out.write_all(&data)?),
            }
        }
        Command::Delete(args) => {
            let outcome = engine.delete(&args.uri, args.recursive)?;
            match format {
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&outcome)?)?,
                OutputFormat::Text => {
                    writeln!(
                        out,
                        "{} Deleted {} {} ({} objects)",
                        "✓".green().bold(),
                        outcome.classification,
                        args.uri.yellow(),
                        outcome.objects_removed,
                    )?;
                    if outcome.container_removed {
                        writeln!(out, "  Container removed")?;
                    }
                    if !outcome.absent {
                        writeln!(out, "  {} entries written meanwhile remain", "!".yellow().bold())?;
                    }
                }
            }
            Ok(())
        }
        Command::Publish(args) => {
            let link = engine.publish(&args.uri, args.ttl)?;
            match format {
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&link)?)?,
                OutputFormat::Text => {
                    writeln!(out, "{}", link.url.blue())?;
                    writeln!(out, "  Expires: {} ({}s)", link.expires_at.to_rfc3339(), link.ttl_secs)?;
                }
            }
            Ok(())
        }
        Command::Exists(args) => {
            let exists = engine.exists(&args.uri)?;
            match format {
                OutputFormat::Json => writeln!(out, "{}", json!({ "uri": args.uri, "exists": exists }))?,
                OutputFormat::Text if exists => writeln!(out, "{} {} exists", "✓".green().bold(), args.uri.yellow())?,
                OutputFormat::Text => writeln!(out, "{} {} does not exist", "✗".red().bold(), args.uri.yellow())?,
            }
            Ok(())
        }
        Command::Serve(_) => anyhow::bail!("serve is not an engine command"),
    }
}

fn payload(input: InputArgs) -> anyhow::Result<Payload> {
    match (input.file, input.content, input.source) {
        (Some(path), _, _) => {
            let bytes = std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Payload::Content(bytes))
        }
        (None, Some(text), _) => Ok(Payload::content(text.into_bytes())),
        (None, None, Some(locator)) => Ok(Payload::Source(locator)),
        (None, None, None) => anyhow::bail!("one of --file, --content or --source is required"),
    }
}

fn report(out: &mut dyn Write, format: OutputFormat, action: &str, target: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", json!({ "action": action.to_lowercase(), "target": target }))?,
        OutputFormat::Text => writeln!(out, "{} {} {}", "✓".green().bold(), action, target.yellow())?,
    }
    Ok(())
}
