use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use teapot_decor::{DecorConfig, MemoryDocument, Outcome, PageDecorator};

#[derive(Parser)]
#[command(name = "teapot-decor")]
#[command(about = "Decorate HTML pages with the Teapot AI logo and footer", version)]
struct Cli {
    /// JSON configuration overriding the built-in branding
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decorate a page and write the resulting HTML
    Decorate {
        #[arg(help = "HTML file, `-` for stdin, or http(s) URL")]
        input: String,
        #[arg(short, long, help = "Output file (stdout when omitted)")]
        output: Option<PathBuf>,
        #[arg(long, help = "Inject even if the page is already decorated")]
        allow_duplicates: bool,
    },
    /// Decorate a page in memory and print what it shows
    Inspect {
        #[arg(help = "HTML file, `-` for stdin, or http(s) URL")]
        input: String,
    },
    /// Print the override stylesheet
    Css,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teapot_decor=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => DecorConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DecorConfig::default(),
    };
    let decorator = PageDecorator::new(&config)?;

    match cli.command {
        Commands::Decorate {
            input,
            output,
            allow_duplicates,
        } => {
            let mut doc = load(&input)?;
            if allow_duplicates {
                decorator.decorate(&mut doc)?;
            } else if decorator.apply_decoration(&mut doc)? == Outcome::AlreadyDecorated {
                log::info!("{} is already decorated", input);
            }
            write_output(output.as_deref(), &doc.to_html())
        }
        Commands::Inspect { input } => {
            let mut doc = load(&input)?;
            decorator.apply_decoration(&mut doc)?;
            let snapshot = teapot_decor::render_text_snapshot(&doc);
            println!("Title: {}", snapshot.title);
            println!("{}", "-".repeat(60));
            println!("{}", snapshot.text);
            Ok(())
        }
        Commands::Css => {
            println!("{}", decorator.overrides().css());
            Ok(())
        }
    }
}

fn load(input: &str) -> Result<MemoryDocument> {
    #[cfg(feature = "fetch")]
    {
        if teapot_decor::fetch::is_remote(input) {
            let cfg = teapot_decor::fetch::FetchConfig::default();
            return Ok(teapot_decor::fetch::fetch_document(input, &cfg)?);
        }
    }

    let html = if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))?
    };
    Ok(MemoryDocument::parse(&html)?)
}

fn write_output(path: Option<&Path>, html: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(html.as_bytes())?;
            out.write_all(b"\n")?;
            Ok(())
        }
    }
}
