mod page;
mod repl;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use clipmark_common::protocol::PageMessage;
use clipmark_engine::config::{ClipmarkConfig, ConfigLoader};
use clipmark_engine::{
    Background, ClipMap, ClipPatch, ClipRepository, JsonFileStore, NewClip, TabHandle,
    TabRuntime,
};
use page::{FrameSpec, frame_at, load_tab, parse_frame_spec, select_text};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clipmark", version, about = "Save, restore and highlight text ranges in HTML pages")]
struct Args {
    /// Config file (defaults to ./clipmark.yaml, then ~/.clipmark/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage file, overriding the configured one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs)]
struct PageArgs {
    /// HTML file of the top document
    #[arg(long)]
    page: PathBuf,

    /// URL the page is served under
    #[arg(long)]
    url: String,

    /// Iframe content as SELECTOR=FILE[@URL]; repeatable
    #[arg(long = "frame", value_parser = parse_frame_spec)]
    frames: Vec<FrameSpec>,
}

#[derive(Subcommand)]
enum Command {
    /// List saved clips, optionally for one page
    List {
        #[arg(long)]
        url: Option<String>,
    },
    /// Save a clip by hand
    Add {
        #[arg(long)]
        url: String,
        #[arg(long)]
        start: String,
        #[arg(long, default_value_t = 0)]
        start_offset: u32,
        #[arg(long)]
        end: String,
        #[arg(long, default_value_t = 0)]
        end_offset: u32,
        /// Selector of the iframe holding the range
        #[arg(long)]
        frame: Option<String>,
        /// Save even if start and end selectors are the same
        #[arg(long)]
        force: bool,
    },
    /// Change fields of a saved clip
    Edit {
        url: String,
        id: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        start_offset: Option<u32>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        end_offset: Option<u32>,
        /// Pass an empty string to move the clip to the top document
        #[arg(long)]
        frame: Option<String>,
    },
    /// Delete one clip
    Delete { url: String, id: String },
    /// Delete every clip of a page
    DeleteUrl { url: String },
    /// Print a page's clips as JSON
    Export {
        url: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import an exported page or a copied clip ("-" reads stdin)
    Import { file: String },
    /// Print the clipboard card of one clip
    Copy { url: String, id: String },
    /// Show or change content settings
    Settings {
        #[arg(long)]
        floating_button: Option<bool>,
        #[arg(long)]
        copy_html: Option<bool>,
    },
    /// Restore every saved clip of a page and print its content
    Show {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Select text in a page and save it, as the floating button does
    Capture {
        #[command(flatten)]
        page: PageArgs,
        /// Text to select
        #[arg(long)]
        find: String,
        /// Frame to select in: 0 is the top document, n the n-th --frame
        #[arg(long, default_value_t = 0)]
        in_frame: usize,
    },
    /// Interactive session against a page
    Session {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };

    // Logs go to stderr; stdout carries command output.
    let filter = EnvFilter::try_from_env("CLIPMARK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store_path = args.store.clone().unwrap_or_else(|| config.storage.path.clone());
    debug!("Using clip store {}", store_path.display());
    let repository = Arc::new(ClipRepository::new(Arc::new(JsonFileStore::new(store_path))));

    if let Err(e) = run(args.command, &config, repository).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    command: Command,
    config: &ClipmarkConfig,
    repository: Arc<ClipRepository>,
) -> anyhow::Result<()> {
    match command {
        Command::List { url } => {
            let clips: ClipMap = match url {
                Some(url) => {
                    let clips = repository.list_for(&url).await?;
                    [(clipmark_common::base_url(&url), clips)].into_iter().collect()
                }
                None => repository.list().await?,
            };
            for (url, clips) in clips {
                println!("{}", url);
                for clip in clips {
                    let frame = clip
                        .frame_selector
                        .as_deref()
                        .map(|f| format!(" in {}", f))
                        .unwrap_or_default();
                    println!(
                        "  {}  {}:{} .. {}:{}{}",
                        clip.id,
                        clip.start_selector,
                        clip.start_offset,
                        clip.end_selector,
                        clip.end_offset,
                        frame
                    );
                }
            }
        }
        Command::Add {
            url,
            start,
            start_offset,
            end,
            end_offset,
            frame,
            force,
        } => {
            let clip = repository
                .add(NewClip {
                    url,
                    start_selector: start,
                    start_offset,
                    end_selector: end,
                    end_offset,
                    frame_selector: frame,
                    text: None,
                    allow_same_selectors: force,
                })
                .await?;
            println!("{}", clip.id);
        }
        Command::Edit {
            url,
            id,
            start,
            start_offset,
            end,
            end_offset,
            frame,
        } => {
            let patch = ClipPatch {
                start_selector: start,
                start_offset,
                end_selector: end,
                end_offset,
                frame_selector: frame,
            };
            let clip = repository.update(&url, &id, patch).await?;
            println!("{}", serde_json::to_string_pretty(&clip)?);
        }
        Command::Delete { url, id } => {
            repository.delete(&url, &id).await?;
        }
        Command::DeleteUrl { url } => {
            let count = repository.delete_url(&url).await?;
            println!("Deleted {} clip(s)", count);
        }
        Command::Export { url, output } => {
            let json = repository.export(&url).await?;
            match output {
                Some(path) => tokio::fs::write(&path, json)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", json),
            }
        }
        Command::Import { file } => {
            let json = if file == "-" {
                let mut input = String::new();
                tokio::io::stdin().read_to_string(&mut input).await?;
                input
            } else {
                tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("Failed to read {}", file))?
            };
            let summary = repository.import(&json).await?;
            println!(
                "Imported {} clip(s) for {} ({} already present)",
                summary.added, summary.url, summary.skipped
            );
        }
        Command::Copy { url, id } => {
            println!("{}", repository.copy_card(&url, &id).await?);
        }
        Command::Settings {
            floating_button,
            copy_html,
        } => {
            if let Some(enabled) = floating_button {
                repository.set_floating_button(enabled).await?;
            }
            if let Some(enabled) = copy_html {
                repository.set_copy_html(enabled).await?;
            }
            let settings = repository.content_settings().await?;
            println!("floating button: {}", settings.floating_button);
            println!("copy html: {}", settings.copy_html);
        }
        Command::Show { page } => {
            let handle = open(&page, config, &repository).await?;
            for clip in repository.list_for(&page.url).await? {
                let answers = handle
                    .request(PageMessage::GetSelectedText(clip.selection()))
                    .await?;
                match answers.first() {
                    Some(answer) => println!("[{}]\n{}\n", clip.id, answer.text),
                    None => println!("[{}] (not found on this page)\n", clip.id),
                }
            }
        }
        Command::Capture {
            page,
            find,
            in_frame,
        } => {
            if !repository.floating_button().await? {
                anyhow::bail!("The floating button is disabled; enable it with `clipmark settings --floating-button true`");
            }
            let handle = open(&page, config, &repository).await?;
            let frame = handle
                .with(move |tab| {
                    let frame = frame_at(tab, in_frame)?;
                    select_text(tab, frame, &find)?;
                    anyhow::Ok(frame)
                })
                .await??;
            let responses = handle.capture(frame, 0).await?;
            if !responses.iter().any(|r| r.success) {
                anyhow::bail!("Selection could not be saved");
            }
            println!("Saved selection for {}", clipmark_common::base_url(&page.url));
        }
        Command::Session { page } => {
            let handle = open(&page, config, &repository).await?;
            repl::run_repl(&handle).await?;
        }
    }
    Ok(())
}

async fn open(
    page: &PageArgs,
    config: &ClipmarkConfig,
    repository: &Arc<ClipRepository>,
) -> anyhow::Result<TabHandle> {
    let settings = repository.content_settings().await?;
    let tab = load_tab(
        &page.page,
        &page.url,
        &page.frames,
        settings,
        config.highlight.settings(),
    )?;
    debug!("Loaded {} with {} frame(s)", page.url, page.frames.len());
    let (handle, _task) = TabRuntime::spawn(tab, Background::new(repository.clone()));
    Ok(handle)
}
