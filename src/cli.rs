use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use atty::Stream;
use clap::{Args, Parser, Subcommand};
use formulae_suggest::{
    FormSnapshot, QuerySource, SuggestClient, SuggestConfig, SuggestionFetcher, SuggestionQuery,
    SuggestionView,
};
use serde_json::json;
use tokio::io::AsyncBufReadExt;

#[derive(Parser, Debug)]
#[command(
    name = "formulae-suggest",
    about = "Query the Formulae - Litterae - Chartae suggestion endpoint",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// Base URL of the search deployment.
    #[arg(long, global = true, default_value = "https://formulae.uni-hamburg.de")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One-shot suggestion lookup for a partial word.
    Suggest {
        /// The partial text as typed so far.
        partial: String,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Read input values from stdin, one per line, and debounce lookups as
    /// they arrive.
    Watch {
        #[command(flatten)]
        form: FormArgs,
        /// Quiet interval in milliseconds before a lookup dispatches.
        #[arg(long, default_value_t = 500)]
        quiet_ms: u64,
    },
}

#[derive(Args, Debug, Clone)]
struct FormArgs {
    /// Complete the regest search box instead of the word search box.
    #[arg(long)]
    regest: bool,
    /// Search lemmas instead of inflected forms.
    #[arg(long)]
    lemmas: bool,
    /// Corpus to search (repeatable).
    #[arg(long = "corpus")]
    corpus: Vec<String>,
    /// Edit distance allowed per search term.
    #[arg(long, default_value_t = 0)]
    fuzziness: u32,
    /// Word distance allowed between search terms.
    #[arg(long, default_value_t = 0)]
    slop: u32,
    /// Require the search terms in order.
    #[arg(long)]
    in_order: bool,
    /// Exact issue date.
    #[arg(long, default_value_t = 0)]
    year: u32,
    #[arg(long, default_value_t = 0)]
    month: u32,
    #[arg(long, default_value_t = 0)]
    day: u32,
    /// Start of the issue date range.
    #[arg(long, default_value_t = 0)]
    year_start: u32,
    #[arg(long, default_value_t = 0)]
    month_start: u32,
    #[arg(long, default_value_t = 0)]
    day_start: u32,
    /// End of the issue date range.
    #[arg(long, default_value_t = 0)]
    year_end: u32,
    #[arg(long, default_value_t = 0)]
    month_end: u32,
    #[arg(long, default_value_t = 0)]
    day_end: u32,
    /// Tolerance in years around the exact date.
    #[arg(long, default_value_t = 0)]
    date_plus_minus: u32,
    /// Exclude documents whose dating extends past the search range.
    #[arg(long)]
    exclusive_date_range: bool,
    /// Restrict to special day names (repeatable).
    #[arg(long = "special-day")]
    special_days: Vec<String>,
}

impl FormArgs {
    fn snapshot(&self) -> FormSnapshot {
        let mut snapshot = FormSnapshot::new();
        snapshot.set_multi("corpus", &self.corpus);
        snapshot.set("fuzziness", self.fuzziness.to_string());
        snapshot.set("slop", self.slop.to_string());
        snapshot.set_flag("in_order", self.in_order);
        snapshot.set("year", self.year.to_string());
        snapshot.set("month", self.month.to_string());
        snapshot.set("day", self.day.to_string());
        snapshot.set("year_start", self.year_start.to_string());
        snapshot.set("month_start", self.month_start.to_string());
        snapshot.set("day_start", self.day_start.to_string());
        snapshot.set("year_end", self.year_end.to_string());
        snapshot.set("month_end", self.month_end.to_string());
        snapshot.set("day_end", self.day_end.to_string());
        snapshot.set("date_plus_minus", self.date_plus_minus.to_string());
        snapshot.set_flag("exclusive_date_range", self.exclusive_date_range);
        snapshot.set_multi("special_days", &self.special_days);
        snapshot.set_flag("lemma_search", self.lemmas);
        snapshot
    }

    fn source(&self) -> QuerySource {
        if self.regest {
            QuerySource::Regest
        } else {
            QuerySource::Text
        }
    }

    fn default_placeholder(&self) -> &'static str {
        if self.regest { "Regest Search" } else { "Word Search" }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();
    let client = SuggestClient::new(&cli.base_url);
    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Command::Suggest { partial, form } => {
            runtime.block_on(handle_suggest(client, partial, form, cli.json))
        }
        Command::Watch { form, quiet_ms } => {
            runtime.block_on(handle_watch(client, form, quiet_ms))
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_suggest(
    client: SuggestClient,
    partial: String,
    form: FormArgs,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let query = SuggestionQuery::new(&form.snapshot(), &partial, form.source());
    let options = client.fetch(&query).await?;

    if as_json {
        let payload = json!({
            "partial": partial,
            "qSource": form.source().to_string(),
            "results": options,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_suggestion_table(&partial, &options);
    }
    Ok(())
}

async fn handle_watch(
    client: SuggestClient,
    form: FormArgs,
    quiet_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let config = SuggestConfig {
        quiet_interval: Duration::from_millis(quiet_ms),
        default_placeholder: form.default_placeholder().to_string(),
    };
    let quiet = config.quiet_interval;
    let snapshot = form.snapshot();
    let mut fetcher = SuggestionFetcher::new(
        Arc::new(client),
        Arc::new(ConsoleView),
        form.source(),
        config,
    );

    if atty::is(Stream::Stdin) {
        eprintln!(
            "Enter the input value as typed so far; an empty line or a value \
             with `*`/`?` suppresses the lookup. Ctrl-D exits."
        );
    }
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        fetcher.keystroke(line.trim_end(), snapshot.clone());
    }
    // let the last scheduled lookup dispatch and render before exiting
    tokio::time::sleep(quiet + Duration::from_millis(1500)).await;
    Ok(())
}

struct ConsoleView;

impl SuggestionView for ConsoleView {
    fn set_placeholder(&self, text: &str) {
        println!("[{text}]");
    }

    fn replace_options(&self, options: &[String]) {
        if options.is_empty() {
            println!("  (no suggestions)");
            return;
        }
        for option in options {
            println!("  {option}");
        }
    }
}

fn print_suggestion_table(partial: &str, rows: &[String]) {
    if rows.is_empty() {
        println!("No suggestions for \"{partial}\".");
        return;
    }
    println!("Suggestions for \"{partial}\":");
    for (idx, row) in rows.iter().enumerate() {
        println!("{:>3}  {}", idx + 1, row);
    }
}
