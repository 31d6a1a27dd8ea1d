use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use atty::Stream;
use clap::{Args, Parser, Subcommand};
use cryptic_hints::{
    AuthorStyle, GeneratedHints, HintGenerator, HintRequest, LlmConfig, UsageTracker, classify,
    detect_author,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cryptic-hints",
    about = "Progressive hints for cryptic crossword clues",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// Log more detail to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    llm: LlmArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// Skip the LLM and use deterministic hints only.
    #[arg(long, global = true)]
    no_llm: bool,
    /// Model identifier for the LLM request.
    #[arg(long, global = true)]
    model: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Append a JSON line with the usage totals after every LLM call.
    #[arg(long, global = true)]
    usage_ledger: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate four hints for one clue.
    Hint {
        /// Explanation paragraph; repeat for more. Reads stdin when absent,
        /// splitting paragraphs on blank lines.
        #[arg(short, long)]
        paragraph: Vec<String>,
        /// Definition phrase; pass twice for a double definition.
        #[arg(short, long)]
        definition: Vec<String>,
        /// Clue surface text.
        #[arg(long)]
        clue: Option<String>,
        /// Known answer.
        #[arg(long)]
        answer: Option<String>,
        /// Author style tag such as petero or verlaine.
        #[arg(long, conflicts_with = "url")]
        author: Option<AuthorStyle>,
        /// Analysis page URL, used to detect the author.
        #[arg(long)]
        url: Option<String>,
    },
    /// Generate hints for every clue of a page read from a JSON file.
    Batch {
        /// Input document; reads stdin when absent.
        input: Option<PathBuf>,
    },
    /// Rank the techniques an explanation describes.
    Classify {
        /// Explanation text.
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Detect the analysis author of a page.
    Author {
        /// Page URL.
        #[arg(long, default_value = "")]
        url: String,
        /// File holding the page text.
        #[arg(long)]
        content_file: Option<PathBuf>,
    },
    /// Serve the JSON API.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Public base URL, for logs.
        #[arg(long)]
        base_url: Option<String>,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Hint {
            paragraph,
            definition,
            clue,
            answer,
            author,
            url,
        } => {
            let paragraphs = if paragraph.is_empty() {
                split_paragraphs(&read_stdin()?)
            } else {
                paragraph
            };
            let author = author.unwrap_or_else(|| match &url {
                Some(url) => detect_author(url, &paragraphs.join("\n")),
                None => AuthorStyle::Generic,
            });
            let request = HintRequest {
                id: None,
                paragraphs,
                definitions: definition,
                clue_text: clue,
                answer,
                author,
            };
            handle_hint(&build_generator(&cli.llm), &request, cli.json)
        }
        Command::Batch { input } => handle_batch(&build_generator(&cli.llm), input.as_deref()),
        Command::Classify { text } => handle_classify(&text.join(" "), cli.json),
        Command::Author { url, content_file } => {
            let content = match content_file {
                Some(path) => fs::read_to_string(&path)
                    .map_err(|err| format!("Failed to read {}: {err}", path.display()))?,
                None => String::new(),
            };
            handle_author(&url, &content, cli.json)
        }
        #[cfg(feature = "web")]
        Command::Serve { addr, base_url } => {
            let generator = std::sync::Arc::new(build_generator(&cli.llm));
            let config = cryptic_hints::web::WebConfig {
                addr,
                base_url: base_url.unwrap_or_else(|| format!("http://{addr}")),
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cryptic_hints::web::serve(config, generator.clone()))?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn build_generator(args: &LlmArgs) -> HintGenerator {
    let mut config = LlmConfig::from_env();
    if args.no_llm {
        config.enabled = false;
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs.max(1));
    }
    let usage = match &args.usage_ledger {
        Some(path) => UsageTracker::persistent(path),
        None => UsageTracker::ephemeral(),
    };
    HintGenerator::new(config, usage)
}

fn read_stdin() -> Result<String, Box<dyn Error>> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    paragraphs
}

fn handle_hint(
    generator: &HintGenerator,
    request: &HintRequest,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let generated = generator.generate(request);
    if as_json {
        let payload = json!({
            "author": request.author,
            "hints": generated.hints,
            "source": generated.source,
            "usage": generator.usage().stats(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_hints(&generated);
        print_usage(generator);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct BatchInput {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    clues: Vec<HintRequest>,
}

#[derive(Serialize)]
struct BatchClue {
    id: Option<String>,
    #[serde(flatten)]
    generated: GeneratedHints,
}

fn handle_batch(generator: &HintGenerator, input: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let raw = match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?,
        None => read_stdin()?,
    };
    let mut batch: BatchInput =
        serde_json::from_str(&raw).map_err(|err| format!("Invalid batch document: {err}"))?;
    let author = detect_author(
        batch.url.as_deref().unwrap_or_default(),
        batch.content.as_deref().unwrap_or_default(),
    );
    for clue in &mut batch.clues {
        if clue.author == AuthorStyle::Generic {
            clue.author = author;
        }
    }

    let results = generator.generate_batch(&batch.clues);
    let clues: Vec<BatchClue> = batch
        .clues
        .into_iter()
        .zip(results)
        .map(|(clue, generated)| BatchClue {
            id: clue.id,
            generated,
        })
        .collect();
    let payload = json!({
        "author": author,
        "clues": clues,
        "usage": generator.usage().stats(),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn handle_classify(text: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    if text.trim().is_empty() {
        return Err("Explanation text cannot be empty".into());
    }
    let matches = classify(text);
    if as_json {
        let payload: Vec<_> = matches
            .iter()
            .map(|m| {
                json!({
                    "technique": m.technique,
                    "score": m.score,
                    "tier": m.tier,
                    "confidence": m.confidence(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    if matches.is_empty() {
        println!("No technique recognised.");
        return Ok(());
    }
    let width = matches
        .iter()
        .map(|m| m.technique.name().len())
        .max()
        .unwrap_or(9)
        .max("TECHNIQUE".len());
    println!("{:<width$}  {:>5}  {:<10}  CONFIDENCE", "TECHNIQUE", "SCORE", "TIER");
    println!("{:-<width$}  -----  ----------  ----------", "");
    for m in &matches {
        let score = if m.is_definitive() {
            "-".to_string()
        } else {
            m.score.to_string()
        };
        println!(
            "{:<width$}  {:>5}  {:<10}  {:.2}",
            m.technique.name(),
            score,
            format!("{:?}", m.tier).to_lowercase(),
            m.confidence()
        );
    }
    Ok(())
}

fn handle_author(url: &str, content: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let author = detect_author(url, content);
    if as_json {
        let payload = json!({
            "author": author,
            "marks_definitions": author.marks_definitions(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{author}");
    }
    Ok(())
}

const LEVEL_TITLES: [&str; 4] = ["Definition", "Technique", "Construction", "Full explanation"];

fn print_hints(generated: &GeneratedHints) {
    let mut markdown = String::new();
    for (idx, (title, hint)) in LEVEL_TITLES.iter().zip(generated.hints.iter()).enumerate() {
        markdown.push_str(&format!("**Hint {} ({title})**: {hint}\n\n", idx + 1));
    }
    render_markdown_block(&format!("Hints ({:?})", generated.source), &markdown);
}

fn print_usage(generator: &HintGenerator) {
    let stats = generator.usage().stats();
    if stats.api_calls == 0 {
        return;
    }
    eprintln!(
        "LLM usage: {} call(s), {} input / {} output tokens, ~${:.4} ({})",
        stats.api_calls,
        stats.input_tokens,
        stats.output_tokens,
        stats.estimated_cost_usd,
        stats.model.as_deref().unwrap_or("unknown model"),
    );
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn markdown_skin() -> MadSkin {
    MadSkin::default()
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("{title}:");
    if stdout_is_tty() {
        let skin = markdown_skin();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
