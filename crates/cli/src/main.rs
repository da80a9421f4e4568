use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use folio_core::{ArticleParser, ParsedContent, ParserConfig, RuleStore, fetch_file, fetch_stdin};
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod echo;

use echo::{format_size, print_banner, print_error, print_extraction_details, print_info, print_step, print_success, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for extracted content
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[value(alias = "md")]
    Markdown,
    Html,
    Json,
}

/// Extract article content from web pages and archive it as Markdown
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author = "Folio Contributors")]
#[command(version)]
#[command(about = "Extract and archive articles from web pages", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<String>,

    /// Domain used for site rule lookup when reading a file or stdin
    #[arg(long, value_name = "DOMAIN")]
    domain: Option<String>,

    /// Source URL recorded for a file or stdin input
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "markdown", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also save the article as Markdown and HTML files in this directory
    #[arg(long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Extra site rule directory, overriding bundled and user rules
    #[arg(long, value_name = "DIR")]
    rules_dir: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Args {
    fn is_url(input: &str) -> bool {
        input.starts_with("http://") || input.starts_with("https://")
    }

    /// Domain for file or stdin input: `--domain`, else the host of `--url`.
    fn local_domain(&self) -> String {
        self.domain
            .clone()
            .or_else(|| {
                self.url
                    .as_deref()
                    .and_then(|u| url::Url::parse(u).ok())
                    .and_then(|u| u.host_str().map(str::to_string))
            })
            .unwrap_or_default()
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "folio_core=debug,folio=debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_rules(rules_dir: Option<&PathBuf>) -> anyhow::Result<RuleStore> {
    let mut rules = RuleStore::with_user_rules().context("Failed to load site rules")?;
    if let Some(dir) = rules_dir {
        let extra =
            RuleStore::from_dir(dir).with_context(|| format!("Failed to load site rules from {}", dir.display()))?;
        rules.merge(extra);
    }
    Ok(rules)
}

fn render(article: &ParsedContent, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Markdown => article.to_markdown(),
        OutputFormat::Html => article.to_html(),
        OutputFormat::Json => {
            let mut json = article.to_json().context("Failed to serialize article")?;
            json.push('\n');
            json
        }
    })
}

async fn run(args: Args, input: String) -> anyhow::Result<()> {
    let started = Instant::now();
    let mut timings = Vec::new();

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    tracing::debug!(?args, "starting");
    let rules = load_rules(args.rules_dir.as_ref())?;
    if args.verbose {
        eprintln!("  {} {}\n", "Site rules:".dimmed(), rules.len().to_string().bright_white());
    }

    let mut config = ParserConfig::builder().timeout(args.timeout);
    if let Some(ua) = &args.user_agent {
        config = config.user_agent(ua.clone());
    }
    let parser = ArticleParser::with_config(config.build(), rules);

    let article = if Args::is_url(&input) {
        if args.verbose {
            print_step(1, 3, &format!("Fetching and extracting {}", input.bright_white().underline()));
        }
        let step = Instant::now();
        let article = parser
            .parse_url(&input)
            .await
            .with_context(|| format!("Failed to extract article from {input}"))?;
        timings.push(("Fetch + extract".to_string(), step.elapsed()));
        article
    } else {
        if args.verbose {
            let source = if input == "-" { "stdin".to_string() } else { format!("file {}", input) };
            print_step(1, 3, &format!("Reading from {}", source.bright_white()));
        }
        let step = Instant::now();
        let html = if input == "-" {
            fetch_stdin().context("Failed to read from stdin")?
        } else {
            fetch_file(&input).with_context(|| format!("Failed to read file: {input}"))?
        };
        timings.push(("Read".to_string(), step.elapsed()));

        let domain = args.local_domain();
        let source_url = args.url.clone().unwrap_or_else(|| input.clone());
        if args.verbose {
            eprintln!("  {} {}", "Size:".dimmed(), format_size(html.len()).bright_white());
            if domain.is_empty() {
                print_warning("No --domain or --url given, site rules will not apply");
            } else {
                eprintln!("  {} {}", "Domain:".dimmed(), domain.bright_white());
            }
            eprintln!();
            print_step(2, 3, "Extracting main content");
        }

        let step = Instant::now();
        let article = parser
            .parse(&html, &domain, &source_url)
            .with_context(|| format!("Failed to extract article from {input}"))?;
        timings.push(("Extract".to_string(), step.elapsed()));
        article
    };

    if args.verbose {
        print_extraction_details(&article);
        print_step(3, 3, "Writing output");
        eprintln!("  {} {}\n", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
    }

    let output = render(&article, args.format)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print!("{}", output),
    }

    if let Some(dir) = &args.save_dir {
        let saved = parser
            .save_article(&article, dir)
            .with_context(|| format!("Failed to save article to {}", dir.display()))?;
        print_success(&format!("Saved {}", saved.markdown_path.display().bright_white()));
        print_success(&format!("Saved {}", saved.html_path.display().bright_white()));
    }

    if args.verbose {
        eprintln!();
        echo::print_timing_summary(started.elapsed(), &timings);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "folio", &mut io::stdout());
        return Ok(());
    }

    init_tracing(args.verbose);

    let Some(input) = args.input.clone() else {
        anyhow::bail!("INPUT is required");
    };

    if let Err(err) = run(args, input).await {
        print_error(&format!("{err:#}"));
        std::process::exit(1);
    }
    Ok(())
}
