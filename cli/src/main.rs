//! notionmd CLI - Notion ⇄ Markdown conversion tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;

use notionmd::asset::{HttpObjectStore, ObjectStore, StorageConfig};
use notionmd::remote::{IntegrationClient, PublicApiClient};
use notionmd::{
    ExportOptions, Exporter, ImportOptions, Importer, JsonFormat, PageId, RenderOptions,
};

#[derive(Parser)]
#[command(name = "notionmd")]
#[command(version)]
#[command(about = "Export Notion pages to Markdown and import them back", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a public page and everything under it
    Export {
        /// Page URL or id
        #[arg(value_name = "URL_OR_ID")]
        page: String,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "notion_export")]
        output: PathBuf,

        /// Session cookie for pages that need one
        #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Skip pages with this title (repeatable)
        #[arg(long, value_name = "TITLE")]
        skip: Vec<String>,

        /// Seconds to wait after every request
        #[arg(long, default_value = "0.3")]
        delay: f64,
    },

    /// Import an exported directory (or one file) as pages
    Import {
        /// Integration token
        #[arg(long, env = "NOTION_INTEGRATION_TOKEN", hide_env_values = true)]
        token: String,

        /// Page to create the tree under
        #[arg(long, value_name = "URL_OR_ID")]
        parent: String,

        /// Directory containing index.md files
        #[arg(short, long, value_name = "DIR", conflicts_with = "file")]
        input: Option<PathBuf>,

        /// Single Markdown file
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Object store endpoint for local assets
        #[arg(long, env = "NOTIONMD_STORE_ENDPOINT")]
        store_endpoint: Option<String>,

        /// Object store bucket
        #[arg(long, env = "NOTIONMD_STORE_BUCKET", requires = "store_endpoint")]
        store_bucket: Option<String>,

        /// Object store token
        #[arg(long, env = "NOTIONMD_STORE_TOKEN", hide_env_values = true)]
        store_token: Option<String>,

        /// Public base URL the bucket is served from
        #[arg(long, env = "NOTIONMD_STORE_PUBLIC_URL")]
        public_url: Option<String>,

        /// Prefix for uploaded object keys
        #[arg(long, value_name = "PREFIX")]
        key_prefix: Option<String>,

        /// Seconds to wait after every request
        #[arg(long, default_value = "0.35")]
        delay: f64,
    },

    /// Print the block tree of a Markdown file as JSON
    Inspect {
        /// Markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render a JSON block tree back to Markdown
    Render {
        /// JSON file written by `inspect`
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Drop color spans
        #[arg(long)]
        no_colors: bool,
    },

    /// Show version information
    Version,
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export {
            page,
            output,
            token,
            skip,
            delay,
        } => cmd_export(&page, &output, token, skip, delay),
        Commands::Import {
            token,
            parent,
            input,
            file,
            store_endpoint,
            store_bucket,
            store_token,
            public_url,
            key_prefix,
            delay,
        } => {
            let store = store_endpoint.map(|endpoint| {
                let mut config = StorageConfig::new(endpoint, store_bucket.unwrap_or_default());
                if let Some(token) = store_token {
                    config = config.with_token(token);
                }
                if let Some(url) = &public_url {
                    config = config.with_public_url(url.clone());
                }
                config
            });
            cmd_import(
                &token,
                &parent,
                input.as_deref(),
                file.as_deref(),
                store,
                key_prefix,
                delay,
            )
        }
        Commands::Inspect {
            input,
            compact,
            output,
        } => cmd_inspect(&input, compact, output.as_deref()),
        Commands::Render {
            input,
            output,
            no_colors,
        } => cmd_render(&input, output.as_deref(), no_colors),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Negative delays mean no delay; NaN and overflowing values are rejected.
fn delay_from_secs(secs: f64) -> Result<Duration, String> {
    if secs < 0.0 {
        return Ok(Duration::ZERO);
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("Invalid delay {}: {}", secs, e))
}

fn cmd_export(
    page: &str,
    output: &Path,
    token: Option<String>,
    skip: Vec<String>,
    delay: f64,
) -> CmdResult {
    let mut options = ExportOptions::new()
        .with_output_dir(output)
        .with_delay(delay_from_secs(delay)?);
    for title in skip {
        options = options.skip_title(title);
    }

    let mut config = options.client_config();
    if let Some(token) = token {
        config = config.with_token(token);
    }
    let client = PublicApiClient::new(config)?;

    let mut exporter = Exporter::new(&client, options);
    let root = exporter.export_tree(page)?;
    let summary = exporter.into_summary();

    println!("{}", "Export Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    if let Some(root) = root {
        println!("{}: {}", "Root".bold(), root.display());
    }
    println!("{}: {}", "Pages".bold(), summary.pages.len());
    println!("{}: {}", "Blocks".bold(), summary.stats.block_count());
    println!("{}: {}", "Words".bold(), summary.stats.word_count);
    println!(
        "{}: {} downloaded, {} reused",
        "Assets".bold(),
        summary.downloaded,
        summary.reused
    );
    if summary.skipped > 0 {
        println!("{}: {}", "Skipped".bold(), summary.skipped);
    }
    if summary.failed > 0 {
        println!("{}: {}", "Failed".yellow().bold(), summary.failed);
    }
    println!("{} Output: {}", "✓".green(), output.display());

    Ok(())
}

fn cmd_import(
    token: &str,
    parent: &str,
    input: Option<&Path>,
    file: Option<&Path>,
    store: Option<StorageConfig>,
    key_prefix: Option<String>,
    delay: f64,
) -> CmdResult {
    let parent = PageId::parse(parent)?;
    let mut options = ImportOptions::new(parent).with_delay(delay_from_secs(delay)?);
    if let Some(prefix) = key_prefix {
        options = options.with_key_prefix(prefix);
    }
    let client = IntegrationClient::new(options.integration_config(token))?;

    let store_client = store.map(HttpObjectStore::new).transpose()?;
    let uploader = match &store_client {
        Some(store) => {
            let public_url = store.config().public_url.as_deref();
            Some(options.uploader(store as &dyn ObjectStore, public_url)?)
        }
        None => None,
    };

    let mut importer = Importer::new(&client, options);
    if let Some(uploader) = uploader {
        importer = importer.with_uploader(uploader);
    }

    match (input, file) {
        (_, Some(file)) => {
            let id = importer.import_single_page(file)?;
            println!("{} Created page {}", "✓".green(), id);
        }
        (input, None) => {
            let input = input.unwrap_or_else(|| Path::new("notion_export"));
            let summary = importer.import_directory(input)?;

            println!("{}", "Import Summary".cyan().bold());
            println!("{}", "─".repeat(40).dimmed());
            println!("{}: {}", "Created".bold(), summary.created.len());
            println!("{}: {}", "Uploaded assets".bold(), summary.uploaded);
            if !summary.failed.is_empty() {
                println!("{}: {}", "Failed".yellow().bold(), summary.failed.len());
                for dir in &summary.failed {
                    println!("  {} {}", "✗".red(), dir.display());
                }
            }
        }
    }

    Ok(())
}

fn cmd_inspect(input: &Path, compact: bool, output: Option<&Path>) -> CmdResult {
    let blocks = notionmd::parse_file(input)?;
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = notionmd::to_json(&blocks, format)?;
    write_output(output, &json)
}

fn cmd_render(input: &Path, output: Option<&Path>, no_colors: bool) -> CmdResult {
    let json = fs::read_to_string(input)?;
    let blocks = notionmd::from_json(&json)?;
    let options = RenderOptions::new().with_html_colors(!no_colors);
    let markdown = notionmd::to_markdown_with_options(&blocks, &options);
    write_output(output, &markdown)
}

fn write_output(output: Option<&Path>, content: &str) -> CmdResult {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("{} Written to {}", "✓".green(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "notionmd".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Notion ⇄ Markdown conversion tool");
    println!();
    println!("License: MIT");
}
