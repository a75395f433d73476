use axohtml::{dom::DOMTree, elements::div, html, text, unsafe_text};
use log::debug;
use serde_json::to_string_pretty;
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs::{create_dir_all, write};
use urutte_content::to_html;
use urutte_msg::{RecordId, ThreadRecord};
use urutte_threads::{reply_count, ThreadView};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to create directory: {0}")]
    CreateDir(#[source] io::Error),
    #[error("Failed to write to file: {0}")]
    WriteFile(#[source] io::Error),
    #[error("Failed to serialize JSON to string: {0}")]
    JsonToString(#[source] serde_json::Error),
}

pub struct Config {
    pub base_dir: PathBuf,
}

impl Config {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Config {
            base_dir: base_dir.into(),
        }
    }
}

pub async fn write_thread_html(
    config: &Config,
    view: &ThreadView<'_>,
    records: &[ThreadRecord],
) -> Result<PathBuf, Error> {
    let Config { base_dir } = config;
    let page_path = base_dir
        .join(view.root.to_page_path())
        .with_extension("html");
    let page_html = render_thread(view, records);
    let page_bytes = page_html.to_string();

    create_parent_dir(&page_path).await?;
    write(&page_path, page_bytes)
        .await
        .map_err(Error::WriteFile)?;
    debug!("wrote {}", page_path.display());

    Ok(page_path)
}

pub async fn write_thread_json(config: &Config, view: &ThreadView<'_>) -> Result<PathBuf, Error> {
    let Config { base_dir } = config;
    let json_path = base_dir
        .join(view.root.to_page_path())
        .with_extension("json");
    let view_json = to_string_pretty(view).map_err(Error::JsonToString)?;

    create_parent_dir(&json_path).await?;
    write(&json_path, view_json)
        .await
        .map_err(Error::WriteFile)?;
    debug!("wrote {}", json_path.display());

    Ok(json_path)
}

async fn create_parent_dir(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await.map_err(Error::CreateDir)?;
    }
    Ok(())
}

/// Thread pages sit next to each other, so a relative link is enough.
pub fn page_href(id: RecordId) -> String {
    format!("{}.html", id)
}

fn replies_label(count: usize) -> String {
    match count {
        0 => "No replies".to_string(),
        1 => "1 reply".to_string(),
        n => format!("{} replies", n),
    }
}

pub fn render_thread(view: &ThreadView<'_>, records: &[ThreadRecord]) -> DOMTree<String> {
    let root = view.root;
    let root_html = to_html(&root.content);
    let root_label = replies_label(view.replies.len());

    let reply_nodes: Vec<Box<div<String>>> = view
        .replies
        .iter()
        .map(|reply| render_reply(reply, reply_count(records, reply.id)))
        .collect();

    html!(
        <html>
            <head>
                <title>{ text!("Thread {}", root.id) }</title>
            </head>
            <body>
                <div class="root">
                    <header>
                        { text!("{}", root.created_at.to_rfc3339()) }
                    </header>
                    <article class="content">
                        { unsafe_text!("{}", root_html) }
                    </article>
                    <footer>
                        { text!("{}", root_label) }
                    </footer>
                </div>
                <div class="replies">
                    { reply_nodes }
                </div>
            </body>
        </html>
    )
}

fn render_reply(reply: &ThreadRecord, count: usize) -> Box<div<String>> {
    let reply_html = to_html(&reply.content);
    let reply_href = page_href(reply.id);
    let label = replies_label(count);

    html!(
        <div class="reply">
            <header>
                { text!("{}", reply.created_at.to_rfc3339()) }
            </header>
            <article class="content">
                { unsafe_text!("{}", reply_html) }
            </article>
            <a href=reply_href>{ text!("{}", label) }</a>
        </div>
    )
}
