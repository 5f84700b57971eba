use std::path::PathBuf;

use ariteg_store::TreeEntry;
use ariteg_types::AritegLink;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ariteg",
    about = "Ariteg: content-addressed archival object store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository directory
    #[arg(long, global = true, default_value = ".ariteg")]
    pub repo: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a repository with a default ariteg.toml
    Init(InitArgs),
    /// Store a file (or stdin) and print its link
    Put(PutArgs),
    /// Restore the content behind a link
    Get(GetArgs),
    /// Store a tree from name=link entries
    Tree(TreeArgs),
    /// Store a commit
    Commit(CommitArgs),
    /// Show an object's storage status
    Probe(LinkArgs),
    /// Verify every object reachable from a link
    Verify(LinkArgs),
    /// Show an object's integrity record
    Meta(LinkArgs),
    /// Delete an object and its integrity record
    Rm(LinkArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct InitArgs {
    /// Store objects zstd-compressed; recorded in ariteg.toml
    #[arg(long)]
    pub compress: bool,
}

#[derive(Args)]
pub struct PutArgs {
    /// File to store; `-` reads stdin
    pub path: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    pub link: AritegLink,
    /// Write content here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Entries as `name=<link>`, in order
    #[arg(value_parser = parse_entry)]
    pub entries: Vec<TreeEntry>,
}

#[derive(Args)]
pub struct CommitArgs {
    /// Root object of the commit
    #[arg(long)]
    pub root: AritegLink,
    #[arg(long)]
    pub parent: Vec<AritegLink>,
    #[arg(short, long, default_value = "")]
    pub message: String,
    #[arg(long, default_value = "")]
    pub author: String,
}

#[derive(Args)]
pub struct LinkArgs {
    pub link: AritegLink,
}

fn parse_entry(s: &str) -> Result<TreeEntry, String> {
    let (name, link) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=<link>, got {s:?}"))?;
    let link = link.parse::<AritegLink>().map_err(|e| e.to_string())?;
    Ok(TreeEntry::new(name, link))
}
