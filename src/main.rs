use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use event_search::{
    ConfigStore, EventSearcher, NewUser, SearchCondition, Searcher, UserRepository, UserStore,
};

#[derive(Parser)]
#[command(name = "event-search")]
#[command(version)]
#[command(about = "Search connpass events and manage local users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search events and print the page as JSON
    Search(SearchArgs),

    /// Inspect or change the stored configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Manage user records
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long)]
    event_id: Option<i64>,

    /// All keywords must match
    #[arg(long)]
    keyword: Option<String>,

    /// Any keyword may match
    #[arg(long)]
    keyword_or: Option<String>,

    /// Year and month, e.g. 202401
    #[arg(long)]
    ym: Option<i32>,

    /// Year, month and day, e.g. 20240115
    #[arg(long)]
    ymd: Option<i32>,

    #[arg(long)]
    nickname: Option<String>,

    #[arg(long)]
    owner_nickname: Option<String>,

    #[arg(long)]
    series_id: Option<i64>,

    /// 1-based page number
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    page: i64,

    /// Results per page
    #[arg(long, default_value_t = 10)]
    count: i64,

    /// Fail on non-2xx responses instead of decoding them
    #[arg(long)]
    strict: bool,

    /// Print only the events array
    #[arg(long)]
    events_only: bool,
}

impl SearchArgs {
    fn condition(&self) -> SearchCondition {
        SearchCondition {
            event_id: self.event_id,
            keyword: self.keyword.clone(),
            keyword_or: self.keyword_or.clone(),
            ym: self.ym,
            ymd: self.ymd,
            nickname: self.nickname.clone(),
            owner_nickname: self.owner_nickname.clone(),
            series_id: self.series_id,
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Store a new search endpoint
    SetEndpoint { url: String },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create a user
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Look a user up by email
    Show {
        #[arg(long)]
        email: String,
    },

    /// Delete a user by id
    Delete {
        #[arg(long)]
        id: i64,
    },
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let cli = Cli::parse();
    let config_store = ConfigStore::load();

    match cli.command {
        Commands::Search(args) => run_search(&config_store, &args),
        Commands::Config { command } => run_config(&config_store, command),
        Commands::User { command } => run_user(&config_store, command),
    }
}

fn run_search(config_store: &ConfigStore, args: &SearchArgs) -> Result<()> {
    let config = config_store.effective();
    let searcher = Searcher::from_config(&config)?
        .require_success_status(config.require_success_status || args.strict);
    let condition = args.condition();

    let output = if args.events_only {
        let events = searcher.search(&condition, args.page, args.count)?;
        serde_json::to_string_pretty(&events)?
    } else {
        let page = searcher.search_page(&condition, args.page, args.count)?;
        log::info!(
            "page {} returned {} of {} events",
            args.page,
            page.results_returned,
            page.results_available
        );
        serde_json::to_string_pretty(&page)?
    };
    println!("{output}");
    Ok(())
}

fn run_config(config_store: &ConfigStore, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&config_store.effective())?);
        }
        ConfigCommand::SetEndpoint { url } => {
            let url = url.trim().to_string();
            reqwest::Url::parse(&url).with_context(|| format!("invalid endpoint {url}"))?;
            config_store.update(|config| config.endpoint = url.clone())?;
            log::info!("endpoint saved to {:?}", config_store.path());
        }
    }
    Ok(())
}

fn run_user(config_store: &ConfigStore, command: UserCommand) -> Result<()> {
    let path = config_store.effective().database_path();
    let store =
        UserStore::open(&path).with_context(|| format!("failed to open user store {path:?}"))?;

    match command {
        UserCommand::Add {
            name,
            email,
            password,
        } => {
            let user = store.create(&NewUser::new(name, email, &password))?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        UserCommand::Show { email } => match store.get_by_email(&email)? {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => bail!("no user with email {email}"),
        },
        UserCommand::Delete { id } => {
            store.delete(id)?;
            log::info!("deleted user {id}");
        }
    }
    Ok(())
}
