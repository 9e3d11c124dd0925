use std::sync::Arc;

use anyhow::Context;
use artifex_server::{ArtifexServer, ServerConfig};
use artifex_service::{AnnotateRequest, ImageService, MutationOutcome};
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Ingest(args) => cmd_ingest(config, args, &cli.format).await,
        Command::List(_) => cmd_list(config, &cli.format).await,
        Command::Annotate(args) => cmd_annotate(config, args, &cli.format).await,
        Command::Draw(args) => cmd_draw(config, args, &cli.format).await,
        Command::ShowConfig(_) => cmd_show_config(&config, &cli.format),
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.storage_root = root.clone();
        config.staging_dir = root.join(".staging");
    }
    if let Command::Serve(ServeArgs { bind: Some(bind) }) = &cli.command {
        config.bind_addr = *bind;
    }
    tracing::debug!(root = %config.storage_root.display(), "effective configuration");
    Ok(config)
}

async fn open_service(config: ServerConfig) -> anyhow::Result<Arc<ImageService>> {
    let root = config.storage_root.clone();
    let server = ArtifexServer::open(config)
        .await
        .with_context(|| format!("cannot open image store at {}", root.display()))?;
    Ok(Arc::clone(server.service()))
}

async fn cmd_serve(config: ServerConfig, _args: ServeArgs) -> anyhow::Result<()> {
    println!(
        "Artifex server on {} (root: {})",
        config.bind_addr.to_string().bold(),
        config.storage_root.display()
    );
    let server = ArtifexServer::open(config).await?;
    server.serve().await?;
    Ok(())
}

async fn cmd_ingest(config: ServerConfig, args: IngestArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    let mut results = Vec::new();
    for path in &args.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let outcome = service.ingest_bytes(&name, bytes).await?;
        let id = &outcome.record.id;
        match format {
            OutputFormat::Json => results.push(json!({
                "file": path.display().to_string(),
                "id": id,
                "digest": outcome.record.digest,
                "deduplicated": outcome.deduplicated,
            })),
            OutputFormat::Text if outcome.deduplicated => {
                println!("  {} {} = {}", "duplicate:".yellow(), path.display(), id.to_string().cyan())
            }
            OutputFormat::Text => {
                println!("  {} {} → {}", "stored:".green(), path.display(), id.to_string().cyan())
            }
        }
    }
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

async fn cmd_list(config: ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    let ids = match service.list().await {
        Ok(ids) => ids,
        Err(e) => match e.empty_catalog() {
            Some(kind) => {
                match format {
                    OutputFormat::Json => println!("[]"),
                    OutputFormat::Text => println!("{}", kind.message().dimmed()),
                }
                return Ok(());
            }
            None => return Err(e.into()),
        },
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ids)?),
        OutputFormat::Text => {
            for id in &ids {
                println!("{id}");
            }
            println!("{} image(s)", ids.len().to_string().bold());
        }
    }
    Ok(())
}

async fn cmd_annotate(config: ServerConfig, args: AnnotateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    let outcome = service
        .annotate(AnnotateRequest {
            image_id: args.id,
            text: args.text,
            x: args.x,
            y: args.y,
        })
        .await?;
    print_mutation("Annotated", &outcome, format)
}

async fn cmd_draw(config: ServerConfig, args: DrawArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    let layer = tokio::fs::read(&args.overlay)
        .await
        .with_context(|| format!("cannot read {}", args.overlay.display()))?;
    let offset = match (args.x, args.y) {
        (None, None) => None,
        (x, y) => Some((x.unwrap_or(0), y.unwrap_or(0))),
    };
    let outcome = service.draw_bytes(&args.id, layer, offset).await?;
    print_mutation("Drew on", &outcome, format)
}

fn print_mutation(verb: &str, outcome: &MutationOutcome, format: &OutputFormat) -> anyhow::Result<()> {
    let r = outcome.region;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "id": outcome.record.id,
                "digest": outcome.record.digest,
                "width": outcome.dimensions.width,
                "height": outcome.dimensions.height,
                "region": { "x": r.x, "y": r.y, "width": r.width, "height": r.height },
            }))?
        ),
        OutputFormat::Text => {
            println!("{} {} {}", "✓".green().bold(), verb, outcome.record.id.to_string().cyan());
            println!("  Size: {}", outcome.dimensions);
            println!("  Region: {}x{} at ({}, {})", r.width, r.height, r.x, r.y);
            println!("  Digest: {}", outcome.record.digest.short_hex().yellow());
        }
    }
    Ok(())
}

fn cmd_show_config(config: &ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", config.to_toml()?),
    }
    Ok(())
}
