//! tagscan CLI
//!
//! Normally the service is started in-process by the host through
//! `tagscan::get_tag_info`. This binary runs the same code from a shell:
//!
//! - `tagscan serve --pipe /tmp/tagpipe` : named pipe protocol, inherited fds
//! - `tagscan serve --stdio`             : requests on stdin, records on stdout
//! - `tagscan inspect a.mp3 b.flac`      : one record per path (ids = argument index)
//! - `tagscan cover-art --fd 7 --out cover.jpg`
//!
//! Logs go to stderr (`RUST_LOG` filters, default `info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use tagscan::core::pool::Inspect;
use tagscan::core::tags::read_cover_art;
use tagscan::{
    FileTask, HandleSource, Inspector, PathTable, ProcessHandles, ServiceConfig, StdioTransport,
};

#[derive(Parser, Debug)]
#[command(name = "tagscan", version, about = "Batch audio tag scanner for host file handles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the batch protocol until the host sends a shutdown request
    Serve(ServeArgs),
    /// Print the record each path would produce
    Inspect {
        /// Audio files; each gets the id of its position (0, 1, ...)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Extract the first embedded picture
    CoverArt(CoverArtArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Named pipe shared with the host (created if missing)
    #[arg(long, env = "TAGSCAN_PIPE", conflicts_with = "stdio")]
    pipe: Option<PathBuf>,

    /// Use stdin/stdout instead of a named pipe
    #[arg(long)]
    stdio: bool,
}

#[derive(Args, Debug)]
struct CoverArtArgs {
    /// Inherited file descriptor
    #[arg(long, conflicts_with = "path")]
    fd: Option<i32>,

    /// Plain file path
    #[arg(long)]
    path: Option<PathBuf>,

    /// Write the image here instead of reporting its size
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("tagscan v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Serve(args) => serve(args),
        Command::Inspect { paths } => inspect(paths),
        Command::CoverArt(args) => cover_art(args),
    }
}

fn serve(args: ServeArgs) -> Result<()> {
    if args.stdio {
        tagscan::serve(StdioTransport, Arc::new(ProcessHandles))?;
        return Ok(());
    }

    let Some(pipe) = args.pipe else {
        bail!("either --pipe <path> or --stdio is required");
    };
    tagscan::run_service(&ServiceConfig::new(pipe)).context("tag service failed")?;
    Ok(())
}

fn inspect(paths: Vec<PathBuf>) -> Result<()> {
    let mut table = PathTable::new();
    for (id, path) in paths.iter().enumerate() {
        table.insert(i32::try_from(id)?, path);
    }

    let inspector = Inspector::new(Arc::new(table));
    let mut lines = Vec::new();
    for id in 0..paths.len() {
        inspector.inspect(FileTask(i32::try_from(id)?), &mut lines);
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn cover_art(args: CoverArtArgs) -> Result<()> {
    let (handles, task): (Box<dyn HandleSource>, FileTask) = match (args.fd, args.path) {
        (Some(fd), _) => (Box::new(ProcessHandles), FileTask(fd)),
        (None, Some(path)) => (Box::new(PathTable::new().with(0, path)), FileTask(0)),
        (None, None) => bail!("either --fd or --path is required"),
    };

    let image = read_cover_art(handles.as_ref(), task);
    match args.out {
        Some(out) => {
            std::fs::write(&out, &image)
                .with_context(|| format!("writing {}", out.display()))?;
            info!(bytes = image.len(), out = %out.display(), "cover art written");
        }
        None => println!("{} bytes", image.len()),
    }
    Ok(())
}
