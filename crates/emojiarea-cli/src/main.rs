use emojiarea_core::{
    CatalogConfig, ContentNode, EditorSession, EmojiAreaOptions, MemorySelection, MemorySurface,
    PickerMenu, PictogramCatalog, tokenize,
};
use miette::{IntoDiagnostic, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "emojiarea - inspect pictogram catalogs and tokenized text", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// More logging (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a catalog file (.toml or .json)
    Check {
        catalog: PathBuf,
    },
    /// Tokenize text against a catalog and print the node sequence
    Tokenize {
        catalog: PathBuf,

        /// Text to tokenize; read from stdin when absent
        text: Option<String>,

        /// Field options file (.toml or .json)
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Print the picker menu a catalog produces
    Menu {
        catalog: PathBuf,
    },
}

fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { catalog } => check(&catalog),
        Commands::Tokenize {
            catalog,
            text,
            options,
        } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .into_diagnostic()?;
                    buf
                }
            };
            tokenize_text(&catalog, &text, options.as_deref())
        }
        Commands::Menu { catalog } => menu(&catalog),
    }
}

fn load_catalog(path: &Path) -> Result<PictogramCatalog> {
    let config = CatalogConfig::load(path)?;
    Ok(PictogramCatalog::from_config(&config)?)
}

fn load_options(path: &Path) -> Result<EmojiAreaOptions> {
    let contents = std::fs::read_to_string(path).into_diagnostic()?;
    let options = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => EmojiAreaOptions::from_json_str(&contents)?,
        _ => EmojiAreaOptions::from_toml_str(&contents)?,
    };
    Ok(options)
}

fn check(path: &Path) -> Result<()> {
    let catalog = load_catalog(path)?;
    println!(
        "{}: {} groups, {} tokens",
        path.display(),
        catalog.groups().len(),
        catalog.len()
    );
    for group in catalog.groups() {
        println!("  {} ({}): {} icons", group.id, group.name, group.icons.len());
    }
    Ok(())
}

fn tokenize_text(path: &Path, text: &str, options: Option<&Path>) -> Result<()> {
    let catalog = Arc::new(load_catalog(path)?);
    let options = options.map(load_options).transpose()?.unwrap_or_default();

    let seq = tokenize(text, &catalog);
    for node in seq.iter() {
        match node {
            ContentNode::Text(span) => println!("text      {:?}", span.text),
            ContentNode::Pictogram(p) => println!("pictogram {} -> {}", p.token, p.image.src),
        }
    }

    // Render into a detached surface and read the value back.
    let session = EditorSession::attach(
        MemorySurface::new(),
        MemorySelection::new(),
        text,
        catalog,
        options,
    );
    let value = session.val();
    println!("value     {:?}", value);
    if value != text {
        tracing::warn!("value differs from input");
    }
    Ok(())
}

fn menu(path: &Path) -> Result<()> {
    let catalog = load_catalog(path)?;
    let menu = PickerMenu::new(&catalog);
    for (i, tab) in menu.tabs().iter().enumerate() {
        let marker = if i == menu.active_index() { "*" } else { " " };
        println!("{marker} [{}] {}", tab.group, tab.label);
        for entry in &tab.entries {
            println!("    {:<20} {}", entry.token, entry.image.src);
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 if cfg!(debug_assertions) => "debug",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
