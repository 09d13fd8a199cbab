use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use scholar::app::study::{Study, StudyFiles};
use scholar::config::progress::ProgressLedger;
use scholar::config::session::Session;
use scholar::course::{self, ChapterPath};
use scholar::gateway::{GatewayClient, TokenStore};
use scholar::learning::{DisplayContext, Language, Navigator};
use scholar::{App, Config, ui};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scholar")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Generation gateway URL (overrides the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Display language: en or bn (overrides the config file)
    #[arg(long, global = true)]
    lang: Option<Language>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List topics with completion
    Topics,
    /// Show a topic's subtopics and chapters
    Show {
        /// Topic number (from `scholar topics`)
        topic: usize,
    },
    /// Generate a new topic and add it to the course
    Add {
        /// Topic title
        title: String,
    },
    /// Remove a topic and its progress
    Remove {
        /// Topic number
        topic: usize,
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Search chapter, subtopic and topic titles
    Search {
        /// Text to look for
        query: String,
    },
    /// Clear all progress
    Reset {
        /// Confirm clearing progress
        #[arg(long)]
        yes: bool,
    },
    /// Study interactively, starting at a chapter or where you left off
    Study {
        /// Topic, subtopic and chapter numbers
        #[arg(num_args = 3, value_names = ["TOPIC", "SUBTOPIC", "CHAPTER"])]
        position: Option<Vec<usize>>,
    },
    /// Manage the gateway bearer token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Store a token in the system keyring
    Set {
        /// Token value
        value: String,
    },
    /// Remove the stored token
    Clear,
    /// Show the stored token (masked)
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, Commands::Study { .. }))?;

    let mut config = Config::load()?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    match cli.command {
        Commands::Topics => {
            let tree = course::load_course()?;
            println!("{}", ui::topic_list(&tree, &ProgressLedger::load()?));
        }
        Commands::Show { topic } => {
            let tree = course::load_course()?;
            let index = topic_index(topic, tree.len())?;
            let text = ui::topic_index(&tree, &ProgressLedger::load()?, index, None)
                .with_context(|| format!("No topic {}", topic))?;
            println!("{}", text);
        }
        Commands::Add { title } => {
            let client = Arc::new(gateway_client(&config)?);
            let topic = course::generate_topic(client.as_ref(), &title).await?;
            let count = topic.chapter_count();

            let mut navigator = open_navigator(client, config.language)?;
            let index = navigator.append_topic(topic)?;
            course::save_course(navigator.tree())?;
            println!("Added topic {} '{}' with {} chapters", index + 1, title.trim(), count);
        }
        Commands::Remove { topic, yes } => {
            let mut navigator = open_navigator(Arc::new(gateway_client(&config)?), config.language)?;
            let index = topic_index(topic, navigator.tree().len())?;
            let title = navigator.tree().topics()[index].title.clone();
            if !yes && !confirm(&format!("Remove topic '{}' and its progress?", title))? {
                println!("Cancelled");
                return Ok(());
            }

            navigator.remove_topic(index)?;
            course::save_course(navigator.tree())?;
            navigator.ledger().save()?;
            println!("Removed topic '{}'", title);
        }
        Commands::Search { query } => {
            let tree = course::load_course()?;
            println!("{}", ui::search_results(&query, &tree.search(&query)));
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("Resetting clears all progress. Re-run with --yes to confirm.");
            }
            let mut navigator = open_navigator(Arc::new(gateway_client(&config)?), config.language)?;
            navigator.reset_progress();
            navigator.ledger().save()?;
            println!("Progress cleared");
        }
        Commands::Study { position } => {
            let start = match position.as_deref() {
                Some(&[t, s, c]) if t > 0 && s > 0 && c > 0 => Some(ChapterPath::new(t - 1, s - 1, c - 1)),
                Some(_) => bail!("Positions are counted from 1, e.g. `scholar study 1 2 3`"),
                None => None,
            };

            let session = Session::load()?;
            let language = cli.lang.or(session.language).unwrap_or(config.language);

            let navigator = open_navigator(Arc::new(gateway_client(&config)?), language)?
                .with_thinking_mode(config.thinking_mode);
            let study = Study::new(navigator, session, StudyFiles::locate()?);
            let mut app = App::new(config, study)?;
            app.run(start).await?;
        }
        Commands::Token { action } => match action {
            TokenAction::Set { value } => {
                TokenStore::set_token(value.trim())?;
                println!("Token saved to system keyring");
            }
            TokenAction::Clear => {
                TokenStore::delete_token()?;
                println!("Token removed");
            }
            TokenAction::Show => match TokenStore::get_token()? {
                Some(token) => println!("{}", TokenStore::mask_token(&token)),
                None => println!("No token stored"),
            },
        },
    }

    Ok(())
}

/// Logs go to stderr, or to a file in the data directory while the TUI owns the screen
fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "scholar=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if to_file {
        let dir = Config::data_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {:?}", dir))?;
        let appender = tracing_appender::rolling::never(dir, "scholar.log");
        registry.with(fmt::layer().with_target(false).with_ansi(false).with_writer(appender)).init();
    } else {
        registry.with(fmt::layer().with_target(false).with_writer(io::stderr)).init();
    }
    Ok(())
}

/// Navigator over the stored course and progress
fn open_navigator(client: Arc<GatewayClient>, language: Language) -> Result<Navigator> {
    let tree = course::load_course()?;
    let ledger = ProgressLedger::load()?;
    Ok(Navigator::new(tree, ledger, client, DisplayContext::new(language)))
}

fn gateway_client(config: &Config) -> Result<GatewayClient> {
    let token = TokenStore::get_token().unwrap_or_else(|e| {
        tracing::warn!("Could not read gateway token: {}", e);
        None
    });
    let client = GatewayClient::new(config.endpoint.clone(), config.request_timeout())?;
    Ok(client.with_token(token))
}

/// Convert a 1-based topic number to an index
fn topic_index(number: usize, len: usize) -> Result<usize> {
    if number == 0 || number > len {
        bail!("No topic {}. Run `scholar topics` to list them.", number);
    }
    Ok(number - 1)
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
