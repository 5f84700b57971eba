use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context};
use ariteg_core::{Ariteg, AritegLink, CommitDraft, LinkType, StorageStatus, StoreReceipt};
use ariteg_index::ProtoMetaRepository;
use colored::Colorize;
use serde_json::json;

use crate::cli::*;
use crate::repo;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        repo: root,
        format,
        ..
    } = cli;
    match command {
        Command::Init(args) => cmd_init(&root, args, format),
        Command::Config => cmd_config(&root, format),
        Command::Put(args) => cmd_put(&repo::open(&root)?, args, format).await,
        Command::Get(args) => cmd_get(&repo::open(&root)?, args, format).await,
        Command::Tree(args) => cmd_tree(&repo::open(&root)?, args, format).await,
        Command::Commit(args) => cmd_commit(&repo::open(&root)?, args, format).await,
        Command::Probe(args) => cmd_probe(&repo::open(&root)?, args, format).await,
        Command::Verify(args) => cmd_verify(&repo::open(&root)?, args, format).await,
        Command::Meta(args) => cmd_meta(&repo::open(&root)?, args, format),
        Command::Rm(args) => cmd_rm(&repo::open(&root)?, args, format).await,
    }
}

fn cmd_init(root: &Path, args: InitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = repo::init(root, args.compress)?;
    match format {
        OutputFormat::Text => {
            println!(
                "{} Initialized Ariteg repository in {}",
                "✓".green().bold(),
                root.display().to_string().bold()
            );
            println!("  Config: {}", config.display());
            if args.compress {
                println!("  Objects are zstd-compressed");
            }
        }
        OutputFormat::Json => println!(
            "{}",
            json!({ "repo": root, "config": config, "compress": args.compress })
        ),
    }
    Ok(())
}

fn cmd_config(root: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let config = repo::load_config(root)?;
    match format {
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

/// Wait for a receipt and report it.
async fn finish(receipt: StoreReceipt, format: OutputFormat) -> anyhow::Result<AritegLink> {
    let link = receipt.link.clone();
    let written = receipt.completion.await.into_result()?.is_some();
    match format {
        OutputFormat::Text => println!(
            "{} {} ({})",
            "✓".green().bold(),
            link.to_string().yellow(),
            if written { "written" } else { "already stored" }
        ),
        OutputFormat::Json => println!(
            "{}",
            json!({ "link": link.to_string(), "written": written })
        ),
    }
    Ok(link)
}

async fn cmd_put(ariteg: &Ariteg, args: PutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let receipt = if args.path.as_os_str() == "-" {
        ariteg.store_stream(std::io::stdin()).await?
    } else {
        let file = File::open(&args.path)
            .with_context(|| format!("cannot open {}", args.path.display()))?;
        ariteg.store_stream(BufReader::new(file)).await?
    };
    finish(receipt, format).await?;
    Ok(())
}

async fn cmd_get(ariteg: &Ariteg, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let link = &args.link;
    match link.link_type {
        LinkType::Blob | LinkType::List => match &args.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("cannot create {}", path.display()))?;
                let mut out = BufWriter::new(file);
                let bytes = ariteg.restore_stream(link, &mut out).await?;
                out.flush()?;
                match format {
                    OutputFormat::Text => eprintln!(
                        "{} Restored {} bytes to {}",
                        "✓".green().bold(),
                        bytes,
                        path.display()
                    ),
                    OutputFormat::Json => println!(
                        "{}",
                        json!({ "link": link.to_string(), "bytes": bytes, "output": path })
                    ),
                }
            }
            None => {
                ariteg.restore_stream(link, &mut std::io::stdout()).await?;
            }
        },
        LinkType::Tree => {
            let tree = ariteg.restore_tree(link).await?;
            match format {
                OutputFormat::Text => {
                    for entry in tree.entries() {
                        println!("{}  {}", entry.link.to_string().dimmed(), entry.name);
                    }
                }
                OutputFormat::Json => {
                    let entries: Vec<_> = tree
                        .entries()
                        .iter()
                        .map(|e| json!({ "name": e.name, "link": e.link.to_string() }))
                        .collect();
                    println!("{}", json!({ "link": link.to_string(), "entries": entries }));
                }
            }
        }
        LinkType::Commit => {
            let commit = ariteg.restore_commit(link).await?;
            let parents: Vec<String> = commit.parents.iter().map(ToString::to_string).collect();
            match format {
                OutputFormat::Text => {
                    println!("{} {}", "commit".yellow().bold(), link.multihash);
                    println!("  Root: {}", commit.root.to_string().cyan());
                    for parent in &parents {
                        println!("  Parent: {}", parent.cyan());
                    }
                    println!("  Author: {}", commit.author);
                    println!("  Timestamp: {}", commit.unix_timestamp_ms);
                    println!("\n    {}", commit.message);
                }
                OutputFormat::Json => println!(
                    "{}",
                    json!({
                        "link": link.to_string(),
                        "root": commit.root.to_string(),
                        "parents": parents,
                        "author": commit.author,
                        "message": commit.message,
                        "unix_timestamp_ms": commit.unix_timestamp_ms,
                    })
                ),
            }
        }
    }
    Ok(())
}

async fn cmd_tree(ariteg: &Ariteg, args: TreeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let receipt = ariteg.store_tree(args.entries).await?;
    finish(receipt, format).await?;
    Ok(())
}

async fn cmd_commit(ariteg: &Ariteg, args: CommitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let draft = args
        .parent
        .into_iter()
        .fold(CommitDraft::new(args.root), CommitDraft::with_parent)
        .with_message(args.message)
        .with_author(args.author);
    let receipt = ariteg.store_commit(draft).await?;
    finish(receipt, format).await?;
    Ok(())
}

async fn cmd_probe(ariteg: &Ariteg, args: LinkArgs, format: OutputFormat) -> anyhow::Result<()> {
    let status = ariteg.probe(&args.link).await?;
    match format {
        OutputFormat::Text => {
            println!("{} {} is available", "✓".green().bold(), args.link.short().yellow());
            println!("  Available from: {}", status.available_from);
            let expires = if status.expired_timestamp == StorageStatus::UNSET {
                "never".to_string()
            } else {
                status.expired_timestamp.to_string()
            };
            println!("  Expires: {expires}");
            match status.size() {
                Some(size) => println!("  Size: {size} bytes"),
                None => println!("  Size: unknown"),
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&status)?),
    }
    Ok(())
}

async fn cmd_verify(ariteg: &Ariteg, args: LinkArgs, format: OutputFormat) -> anyhow::Result<()> {
    let summary = ariteg.walk(&args.link).await?;
    match format {
        OutputFormat::Text => {
            println!("{} Object graph verified", "✓".green().bold());
            println!("  Commits: {}", summary.commits);
            println!("  Trees: {}", summary.trees);
            println!("  Lists: {}", summary.lists);
            println!("  Blobs: {}", summary.blobs);
            println!("  Stored bytes: {}", summary.bytes);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
    }
    Ok(())
}

fn cmd_meta(ariteg: &Ariteg, args: LinkArgs, format: OutputFormat) -> anyhow::Result<()> {
    let Some(meta) = ariteg.index().get(&args.link.multihash.to_hex())? else {
        bail!("no integrity record for {}", args.link);
    };
    match format {
        OutputFormat::Text => {
            println!("Primary:   {}", meta.primary_hash.yellow());
            println!("Secondary: {}", meta.secondary_hash.cyan());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&meta)?),
    }
    Ok(())
}

async fn cmd_rm(ariteg: &Ariteg, args: LinkArgs, format: OutputFormat) -> anyhow::Result<()> {
    let existed = ariteg.delete(&args.link).await?;
    match format {
        OutputFormat::Text if existed => {
            println!("{} Removed {}", "✓".green().bold(), args.link.short().yellow())
        }
        OutputFormat::Text => println!("Nothing to remove for {}", args.link.short()),
        OutputFormat::Json => println!(
            "{}",
            json!({ "link": args.link.to_string(), "removed": existed })
        ),
    }
    Ok(())
}
