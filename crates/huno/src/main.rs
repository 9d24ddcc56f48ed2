use clap::{Parser, Subcommand};
use huno::cli::commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huno")]
#[command(author, version, about = "Personal fitness dashboard core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Profile to use
    #[arg(short, long, global = true, env = "HUNO_PROFILE")]
    profile: Option<String>,

    /// Verbose per-attempt logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Authentication commands
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// User profile commands
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Fetch and canonicalize one day of wellness data
    Fetch {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Days of history to include (default: 28)
        #[arg(long, default_value = "28")]
        days: u32,
        /// Bypass the profile cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Compute a training recommendation from questionnaire answers
    Recommend {
        /// Path to a JSON file of questionnaire answers
        #[arg(short, long)]
        input: String,
    },
    /// Build the full export document (profile + recommendation)
    Export {
        /// Path to a JSON file of questionnaire answers
        #[arg(short, long)]
        onboarding: String,
        /// Output file path (stdout if omitted)
        #[arg(short = 'O', long)]
        output: Option<String>,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Days of history to include (default: 28)
        #[arg(long, default_value = "28")]
        days: u32,
        /// Bypass the profile cache
        #[arg(long)]
        no_cache: bool,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Login to the vendor service
    Login {
        /// Email address
        #[arg(short, long, env = "HUNO_EMAIL")]
        email: Option<String>,
    },
    /// Logout and clear the stored session
    Logout,
    /// Show authentication status
    Status,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show user profile
    Show,
    /// Show user settings
    Settings,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose || std::env::var("HUNO_DEBUG").map(|v| v == "1").unwrap_or(false)
    {
        "huno=debug"
    } else {
        "huno=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> huno::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Auth { command } => match command {
            AuthCommands::Login { email } => commands::login(email, cli.profile).await,
            AuthCommands::Logout => commands::logout(cli.profile).await,
            AuthCommands::Status => commands::status(cli.profile).await,
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::show_profile(cli.profile).await,
            ProfileCommands::Settings => commands::show_settings(cli.profile).await,
        },
        Commands::Fetch {
            date,
            days,
            no_cache,
        } => commands::fetch(date, days, no_cache, cli.profile).await,
        Commands::Recommend { input } => commands::recommend(input).await,
        Commands::Export {
            onboarding,
            output,
            date,
            days,
            no_cache,
        } => commands::export(onboarding, output, date, days, no_cache, cli.profile).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", huno::error::format_user_error(&e));
        std::process::exit(1);
    }

    Ok(())
}
