//! # Start Editor
//!
//! Command line front end for the editor: loads a document through a fully
//! assembled editor and exports it again.
//!
//! ## Quick Start
//!
//! ```bash
//! # Normalize a markup file
//! cargo run -- convert page.html
//!
//! # Markup to serialized tree
//! cargo run -- convert page.html --to json
//!
//! # Show node types, mark types and commands
//! cargo run -- schema
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use start_core::{Config, Content, Editor, EditorOptions};

/// Start Editor - a rich-text editor assembled from content types and extensions
#[derive(Parser, Debug)]
#[command(name = "start-editor")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a document and print it in the requested format
    Convert {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Input format (guessed from the extension when omitted)
        #[arg(long, value_enum)]
        from: Option<Format>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Html)]
        to: Format,
    },

    /// List node types, mark types and the command table
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    Json,
}

impl Format {
    fn guess(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Html,
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::load()),
    }
}

fn convert(config: &Config, file: &Path, from: Option<Format>, to: Format) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let content = match from.unwrap_or_else(|| Format::guess(file)) {
        Format::Html => Content::Markup(text),
        Format::Json => Content::Tree(
            serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", file.display()))?,
        ),
    };

    let mut editor = Editor::new(EditorOptions::from_config(config, content))?;
    let output = match to {
        Format::Html => editor.export_markup()?,
        Format::Json => serde_json::to_string_pretty(&editor.export_json()?)?,
    };
    editor.destroy()?;
    Ok(output)
}

fn describe_schema(config: &Config) -> anyhow::Result<String> {
    let editor = Editor::new(EditorOptions::from_config(config, ""))?;
    let schema = editor.schema();
    let mut out = String::new();

    writeln!(out, "nodes: {}", schema.node_names().join(", "))?;
    writeln!(out, "marks: {}", schema.mark_names().join(", "))?;
    writeln!(out, "extensions: {}", editor.extensions().ids().collect::<Vec<_>>().join(", "))?;
    writeln!(out, "commands:")?;
    for content_type in editor.commands().content_types() {
        let Some(commands) = editor.commands().commands(content_type) else {
            continue;
        };
        if commands.is_empty() {
            continue;
        }
        writeln!(out, "  {}: {}", content_type, commands.keys().collect::<Vec<_>>().join(", "))?;
    }
    Ok(out)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    tracing::info!("Starting Start Editor v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_deref())?;
    let output = match args.command {
        Command::Convert { file, from, to } => convert(&config, &file, from, to)?,
        Command::Schema => describe_schema(&config)?,
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["start-editor", "convert", "page.html", "--to", "json", "-vv"]);
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Convert { file, from, to } => {
                assert_eq!(file, PathBuf::from("page.html"));
                assert_eq!(from, None);
                assert_eq!(to, Format::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_format_guess() {
        assert_eq!(Format::guess(Path::new("doc.JSON")), Format::Json);
        assert_eq!(Format::guess(Path::new("doc.html")), Format::Html);
        assert_eq!(Format::guess(Path::new("doc")), Format::Html);
    }

    #[test]
    fn test_convert_markup_to_json_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("page.html");
        std::fs::write(&html, "<h1>Hi</h1><p>there</p>").unwrap();

        let config = Config::default();
        let json = convert(&config, &html, None, Format::Json).unwrap();
        let tree = dir.path().join("page.json");
        std::fs::write(&tree, &json).unwrap();

        let back = convert(&config, &tree, None, Format::Html).unwrap();
        assert_eq!(back, "<h1>Hi</h1><p>there</p>");
    }

    #[test]
    fn test_convert_reports_missing_file() {
        let err = convert(&Config::default(), Path::new("/nonexistent/page.html"), None, Format::Html)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_describe_schema_lists_commands() {
        let out = describe_schema(&Config::default()).unwrap();
        assert!(out.starts_with("nodes: doc, text, paragraph"));
        assert!(out.contains("  heading: setHeading, toggleHeading"));
        assert!(!out.contains("  span:"));
    }
}
