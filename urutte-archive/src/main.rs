use clap::Parser;
use log::{info, warn};
use progress_bar::{
    finalize_progress_bar, inc_progress_bar, init_progress_bar, set_progress_bar_action, Color,
    Style,
};
use simple_home_dir::home_dir;
use std::{collections::HashSet, io, path::PathBuf};
use tracing_subscriber::EnvFilter;
use urutte_msg::{Page, RecordId, ThreadRecord};
use urutte_pages::{write_thread_html, write_thread_json, Config};
use urutte_threads::ThreadView;

#[derive(Parser, Debug)]
#[command(
    name = "urutte-archive",
    about = "Render exported Urutte threads as static pages"
)]
struct Cli {
    /// JSON export of thread records, a bare list or a page wrapper
    input: PathBuf,

    /// Directory to write pages into [default: ~/.urutte/archive]
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Only write the page for this record and the pages of its replies,
    /// all the way down, so every reply link resolves
    #[arg(short, long)]
    thread: Option<RecordId>,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Failed to read input file, cause: {0}")]
    ReadInput(#[source] io::Error),
    #[error("Failed to parse input, cause: {0}")]
    Parse(#[from] urutte_msg::Error),
    #[error("Failed to write pages, cause: {0}")]
    Pages(#[from] urutte_pages::Error),
    #[error("No home directory found, pass --out-dir")]
    NoHomeDir,
    #[error("Thread {0} not found in input")]
    ThreadNotFound(RecordId),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let base_dir = match cli.out_dir {
        Some(out_dir) => out_dir,
        None => default_out_dir()?,
    };

    let json = tokio::fs::read_to_string(&cli.input)
        .await
        .map_err(Error::ReadInput)?;
    let page: Page<ThreadRecord> = Page::from_json_str(&json)?;
    if page.has_more {
        warn!("input is not the last page, replies on later pages are missing");
    }
    let records = page.items;
    info!("read {} records from {}", records.len(), cli.input.display());

    let targets: Vec<RecordId> = match cli.thread {
        Some(id) => subtree_targets(&records, id)?,
        None => records.iter().map(|record| record.id).collect(),
    };

    let config = Config::new(base_dir);
    let written = archive(&config, &records, &targets).await?;

    info!("wrote {} pages to {}", written, config.base_dir.display());
    Ok(())
}

fn default_out_dir() -> Result<PathBuf, Error> {
    let home = home_dir().ok_or(Error::NoHomeDir)?;
    Ok(home.join(".urutte").join("archive"))
}

// The record and everything below it, one assembler level at a time.
fn subtree_targets(records: &[ThreadRecord], root: RecordId) -> Result<Vec<RecordId>, Error> {
    let view = ThreadView::assemble(records, root).ok_or(Error::ThreadNotFound(root))?;

    let mut targets = vec![root];
    let mut seen: HashSet<RecordId> = HashSet::from([root]);
    let mut pending = view.reply_ids();
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        targets.push(id);
        if let Some(view) = ThreadView::assemble(records, id) {
            pending.extend(view.reply_ids());
        }
    }

    Ok(targets)
}

async fn archive(
    config: &Config,
    records: &[ThreadRecord],
    targets: &[RecordId],
) -> Result<usize, Error> {
    init_progress_bar(targets.len());
    set_progress_bar_action("Writing", Color::Blue, Style::Bold);

    let result = write_pages(config, records, targets).await;

    finalize_progress_bar();
    result
}

async fn write_pages(
    config: &Config,
    records: &[ThreadRecord],
    targets: &[RecordId],
) -> Result<usize, Error> {
    let mut written = 0;
    for &target in targets {
        let view = ThreadView::assemble(records, target).ok_or(Error::ThreadNotFound(target))?;
        write_thread_html(config, &view, records).await?;
        write_thread_json(config, &view).await?;
        written += 1;
        inc_progress_bar();
    }
    Ok(written)
}
