use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use webtag::config::ScraperConfig;
use webtag::presets::{Preset, PresetStore, DEFAULT_PRESETS_FILE};
use webtag::strategy::PageDiagnostics;
use webtag::{
    remediation_hints, Attribute, ExportFormat, Exporter, ExtractionReport, ExtractionRequest,
    Mode, Orchestrator,
};

/// Base pause for `--retries`; attempt k waits k times this long.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(3);

const PREVIEW_ITEMS: usize = 10;

/// Extract content from web pages by CSS selector
#[derive(Parser, Debug)]
#[command(name = "webtag", version)]
#[command(about = "Extract content from web pages by CSS selector", long_about = None)]
pub struct Args {
    /// Page to extract from (https:// is added when no scheme is given)
    pub url: Option<String>,

    /// CSS selector for the target elements
    pub selector: Option<String>,

    /// Output file name inside --output-dir; the format's extension is appended
    #[arg(short, long, default_value = "extracted_data")]
    pub output: String,

    /// `text`, `html`, or any attribute name such as `href`
    #[arg(short, long)]
    pub attribute: Option<String>,

    /// simple, selenium or auto
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Walk this many pages instead of detecting the count
    #[arg(long)]
    pub pages: Option<u32>,

    /// Query parameter carrying the page number
    #[arg(long, default_value = "page")]
    pub page_param: String,

    /// Seconds to wait before the static request
    #[arg(long, default_value_t = 0.0)]
    pub delay: f64,

    /// Request and element-wait timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Fill url, selector, attribute, mode and filter from a named preset
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Print the available presets and exit
    #[arg(short, long)]
    pub list_presets: bool,

    #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Keep only values containing this text
    #[arg(long)]
    pub contains: Option<String>,

    /// Follow pagination (static) or click load-more controls (browser)
    #[arg(long)]
    pub paginate: bool,

    /// Upper bound on detected page counts
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Scroll budget for the browser strategy; 0 disables scrolling
    #[arg(long)]
    pub max_scrolls: Option<u32>,

    /// Load-more click budget for the browser strategy
    #[arg(long)]
    pub max_clicks: Option<u32>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_PRESETS_FILE)]
    pub presets_file: PathBuf,

    #[arg(long, default_value = "outputs")]
    pub output_dir: PathBuf,

    /// WebDriver endpoint, e.g. a running chromedriver
    #[arg(long)]
    pub webdriver: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub no_headless: bool,

    /// Try the configured fallback selectors when the given one finds nothing
    #[arg(long)]
    pub fallback: bool,

    /// Extra static attempts with growing delays (simple mode only)
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Print what the page contains instead of extracting
    #[arg(long)]
    pub diagnose: bool,

    /// Store the current url/selector/options as a preset with this name
    #[arg(long)]
    pub save_preset: Option<String>,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

pub async fn run(args: Args) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    };
    if let Some(endpoint) = &args.webdriver {
        config.browser.webdriver_url = endpoint.clone();
    }
    if args.no_headless {
        config.browser.headless = false;
    }

    let mut store = PresetStore::load(&args.presets_file);
    if args.list_presets {
        print_presets(store.presets());
        return Ok(ExitCode::SUCCESS);
    }

    let preset = args.preset.as_deref().map(|name| store.get(name)).transpose()?.cloned();
    let req = build_request(&args, preset.as_ref())?;

    if let Some(name) = &args.save_preset {
        store.upsert(Preset {
            name: name.clone(),
            url: req.url.clone(),
            selector: req.selector.clone(),
            attribute: req.attribute.clone(),
            mode: req.mode,
            contains: req.contains.clone(),
            description: preset.map(|p| p.description).unwrap_or_default(),
        });
        store.save()?;
        println!("Saved preset `{name}` to {}", store.path().display());
    }

    let orchestrator = Orchestrator::new(config)?;

    if args.diagnose {
        let diagnostics = orchestrator
            .static_strategy()
            .diagnose(&req.url, req.timeout)
            .await?;
        print_diagnostics(&req.url, &diagnostics);
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current step");
            cancel.cancel();
        }
    });

    let report = extract(&orchestrator, &req, &args).await?;

    for error in &report.errors {
        eprintln!("warning: {}", error.user_message());
    }

    let result = report.result;
    if result.is_empty() {
        eprintln!("No data found with selector `{}`", req.selector);
        eprintln!("Suggestions:");
        for hint in remediation_hints(result.mode_used) {
            eprintln!("  - {hint}");
        }
        return Ok(ExitCode::FAILURE);
    }

    println!(
        "Extracted {} items ({}, {} page{})",
        result.len(),
        result.mode_used,
        result.page_count,
        if result.page_count == 1 { "" } else { "s" }
    );
    for (i, item) in result.items.iter().take(PREVIEW_ITEMS).enumerate() {
        println!("  {:>3}. {item}", i + 1);
    }
    if result.len() > PREVIEW_ITEMS {
        println!("  ... and {} more", result.len() - PREVIEW_ITEMS);
    }

    let path = Exporter::new(&args.output_dir).export(&result, &args.output, args.format)?;
    println!("Saved to {}", path.display());

    Ok(ExitCode::SUCCESS)
}

async fn extract(
    orchestrator: &Orchestrator,
    req: &ExtractionRequest,
    args: &Args,
) -> Result<ExtractionReport> {
    let strategy = orchestrator.static_strategy();

    if args.fallback {
        let (selector, result) = strategy
            .run_with_fallbacks(
                req,
                &orchestrator.config().fallback_selectors,
                orchestrator.cleaner(),
            )
            .await?;
        if !result.is_empty() && selector != req.selector {
            info!("Fallback selector `{selector}` matched");
        }
        return Ok(result.into());
    }

    if args.retries > 0 && req.mode == Mode::Simple && !req.paginate {
        let result = strategy
            .run_with_retry(req, args.retries, RETRY_BASE_DELAY)
            .await?;
        return Ok(result.into());
    }

    Ok(orchestrator.extract(req).await?)
}

/// Positional arguments and flags win over preset values.
fn build_request(args: &Args, preset: Option<&Preset>) -> Result<ExtractionRequest> {
    let url = args
        .url
        .clone()
        .or_else(|| preset.map(|p| p.url.clone()))
        .context("a URL is required, either positionally or through --preset")?;
    let selector = args
        .selector
        .clone()
        .or_else(|| preset.map(|p| p.selector.clone()))
        .context("a CSS selector is required, either positionally or through --preset")?;

    let attribute = match (&args.attribute, preset) {
        (Some(raw), _) => Attribute::from(raw.as_str()),
        (None, Some(p)) => p.attribute.clone(),
        (None, None) => Attribute::Text,
    };
    let mode = args
        .mode
        .or_else(|| preset.map(|p| p.mode))
        .unwrap_or_default();
    let contains = args
        .contains
        .clone()
        .or_else(|| preset.and_then(|p| p.contains.clone()));

    let delay = Duration::try_from_secs_f64(args.delay)
        .with_context(|| format!("invalid --delay {}", args.delay))?;

    let mut builder = ExtractionRequest::builder(url, selector)
        .attribute(attribute)
        .mode(mode)
        .contains(contains)
        .paginate(args.paginate)
        .pages(args.pages)
        .page_param(args.page_param.as_str())
        .delay(delay)
        .timeout(Duration::from_secs(args.timeout));

    if let Some(max_pages) = args.max_pages {
        builder = builder.max_pages(max_pages);
    }
    if let Some(max_scrolls) = args.max_scrolls {
        builder = builder.max_scrolls(max_scrolls);
    }
    if let Some(max_clicks) = args.max_clicks {
        builder = builder.max_load_more_clicks(max_clicks);
    }

    Ok(builder.build()?)
}

fn print_presets(presets: &[Preset]) {
    println!("Available presets:");
    for preset in presets {
        println!("  {}", preset.display_name());
        println!("      {}  `{}`", preset.url, preset.selector);
        if !preset.description.is_empty() {
            println!("      {}", preset.description);
        }
    }
}

fn print_diagnostics(url: &str, diagnostics: &PageDiagnostics) {
    println!("Diagnostics for {url}");
    println!(
        "  Title: {}",
        diagnostics.title.as_deref().unwrap_or("(none)")
    );
    for (tag, count) in &diagnostics.element_counts {
        println!("  {tag:<5} {count}");
    }
    if !diagnostics.sample_headings.is_empty() {
        println!("  Sample h2 headings:");
        for heading in &diagnostics.sample_headings {
            println!("    - {heading}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("webtag").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_build_request() {
        let args = parse(&[
            "example.com/list",
            ".item",
            "-a",
            "href",
            "-m",
            "simple",
            "--pages",
            "3",
            "--page-param",
            "p",
            "--delay",
            "1.5",
        ]);
        let req = build_request(&args, None).unwrap();
        assert_eq!(req.url, "https://example.com/list");
        assert_eq!(req.attribute, Attribute::Named("href".to_string()));
        assert_eq!(req.mode, Mode::Simple);
        assert!(req.paginate);
        assert_eq!(req.pages, Some(3));
        assert_eq!(req.page_param, "p");
        assert_eq!(req.delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_preset_fills_missing_values() {
        let preset = Preset {
            name: "Expo".to_string(),
            url: "https://expo.example".to_string(),
            selector: "h3".to_string(),
            attribute: Attribute::Html,
            mode: Mode::Selenium,
            contains: Some("Ltd".to_string()),
            description: String::new(),
        };
        let args = parse(&["-p", "Expo", "-f", "json"]);
        let req = build_request(&args, Some(&preset)).unwrap();
        assert_eq!(req.selector, "h3");
        assert_eq!(req.attribute, Attribute::Html);
        assert_eq!(req.mode, Mode::Selenium);
        assert_eq!(req.contains.as_deref(), Some("Ltd"));
        assert_eq!(args.format, ExportFormat::Json);

        let args = parse(&["https://other.example", "-m", "auto"]);
        let req = build_request(&args, Some(&preset)).unwrap();
        assert_eq!(req.url, "https://other.example/");
        assert_eq!(req.selector, "h3");
        assert_eq!(req.mode, Mode::Auto);
    }

    #[test]
    fn test_missing_url_is_an_error() {
        let args = parse(&["-f", "txt"]);
        assert!(build_request(&args, None).is_err());
    }
}
