use clap::Parser;
use tokenstore::{TokenRepository, TokenService, TokenStore, TokenStoreBuilder};
use tracing_subscriber::EnvFilter;

/// Command line interface for administering a tokenstore database
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string (sqlite://... or postgres://...)
    #[arg(long, env = "TOKENSTORE_DATABASE_URL", global = true)]
    db_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(clap::Subcommand, Clone, Copy)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Print the number of stored tokens, expired ones included
    Count,
    /// Remove expired tokens
    PurgeExpired,
    /// Remove every token
    Clear,
    /// Print version information
    Version,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("--db-url or TOKENSTORE_DATABASE_URL is required for this command")]
    MissingDatabaseUrl,

    #[error("Unsupported database URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error(transparent)]
    Builder(#[from] tokenstore::TokenStoreBuilderError),

    #[error(transparent)]
    Store(#[from] tokenstore::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Version = cli.command {
        println!("tokenstore v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let url = cli.db_url.ok_or(CliError::MissingDatabaseUrl)?;
    let migrate = matches!(cli.command, Commands::Migrate);

    if url.starts_with("sqlite:") {
        #[cfg(feature = "sqlite")]
        {
            let store = TokenStoreBuilder::new()
                .with_sqlite(&url)
                .await?
                .apply_migrations(migrate)
                .build()
                .await?;
            return execute(cli.command, &store).await;
        }
    }

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        #[cfg(feature = "postgres")]
        {
            let store = TokenStoreBuilder::new()
                .with_postgres(&url)
                .await?
                .apply_migrations(migrate)
                .build()
                .await?;
            return execute(cli.command, &store).await;
        }
    }

    let scheme = url.split(':').next().unwrap_or_default().to_string();
    Err(CliError::UnsupportedScheme(scheme))
}

async fn execute<R: TokenRepository>(
    command: Commands,
    store: &TokenService<R>,
) -> Result<(), CliError> {
    match command {
        // Applied by the builder
        Commands::Migrate => println!("Migrations applied"),
        Commands::Count => println!("{}", store.length().await?),
        Commands::PurgeExpired => {
            let removed = store.purge_expired().await?;
            println!("Removed {removed} expired tokens");
        }
        Commands::Clear => {
            store.clear().await?;
            println!("Removed all tokens");
        }
        Commands::Version => {}
    }
    Ok(())
}
