use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use markdown_embeds_config::Config;
use markdown_embeds_engine::{Flavor, render_document, reverse_value};
use markdown_embeds_syntax::{Document, lex, parser, split_front_matter};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{fs, io, process};

#[derive(Parser)]
#[command(name = "markdown-embeds")]
#[command(about = "Render extended markdown into chat embeds, and back")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file to embed JSON
    Render {
        /// Markdown file, or `-` for stdin
        input: PathBuf,
        /// Group containers into messages
        #[arg(long)]
        messages: bool,
        /// Output flavor, overriding the config file
        #[arg(long, value_enum)]
        flavor: Option<FlavorArg>,
        /// Config file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Turn embed or message JSON back into markdown
    Reverse {
        /// JSON file, or `-` for stdin
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the token stream
    Tokens { input: PathBuf },
    /// Print the syntax tree as JSON
    Tree { input: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum FlavorArg {
    Markdown,
    Html,
}

impl From<FlavorArg> for Flavor {
    fn from(arg: FlavorArg) -> Self {
        match arg {
            FlavorArg::Markdown => Flavor::Markdown,
            FlavorArg::Html => Flavor::Html,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:?}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            input,
            messages,
            flavor,
            config,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let mut options = config.render_options();
            if let Some(flavor) = flavor {
                options.flavor = flavor.into();
            }

            let source = read_input(&input)?;
            let document = parse_timed(&source, options.max_depth)?;

            let start = Instant::now();
            let rendered = render_document(&document, &options, &config.command_table())?;
            log::info!(
                "render: {} containers in {:?}",
                rendered.embeds.len(),
                start.elapsed()
            );

            let json = if messages {
                serde_json::to_string_pretty(&rendered.messages())?
            } else {
                serde_json::to_string_pretty(&rendered)?
            };
            write_output(output.as_deref(), &json)
        }
        Commands::Reverse { input, output } => {
            let source = read_input(&input)?;
            let value: serde_json::Value =
                serde_json::from_str(&source).context("input is not valid JSON")?;
            let markdown = reverse_value(&value).context("input is not embed or message JSON")?;
            write_output(output.as_deref(), &markdown)
        }
        Commands::Tokens { input } => {
            let source = read_input(&input)?;
            let (_, body) = split_front_matter(&source)?;
            for token in lex(body) {
                println!("{:?} {:?}", token.kind, token.text);
            }
            Ok(())
        }
        Commands::Tree { input } => {
            let source = read_input(&input)?;
            let document = parse_timed(&source, markdown_embeds_syntax::DEFAULT_MAX_DEPTH)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let loaded = match path {
        Some(path) => {
            let expanded = Config::expand_path(path).unwrap_or_else(|| path.to_path_buf());
            let config = Config::load_from_path(&expanded)?;
            if config.is_none() {
                anyhow::bail!("config file {} does not exist", expanded.display());
            }
            config
        }
        None => Config::load()?,
    };
    Ok(loaded.unwrap_or_default())
}

/// Parse with lex and parse timings logged separately.
fn parse_timed(source: &str, max_depth: usize) -> Result<Document> {
    let (front_matter, body) = split_front_matter(source)?;

    let start = Instant::now();
    let tokens = lex(body);
    log::info!("lex: {} tokens in {:?}", tokens.len(), start.elapsed());

    let start = Instant::now();
    let children = parser::Parser::with_max_depth(&tokens, max_depth).parse()?;
    log::info!("parse: {} blocks in {:?}", children.len(), start.elapsed());

    Ok(Document {
        front_matter,
        children,
    })
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return Ok(source);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, format!("{content}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}
