mod query;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use restolover_core::AppConfig;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "restolover-cli")]
#[command(about = "Restolover command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Insert the canonical speciality names from the keyword tables
    SeedSpecialities,
    /// Show how a free-text query is interpreted, without querying the database
    Parse {
        /// Query words, e.g. `sushi lyon`
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Answer a free-text query against the database
    Chat {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List active restaurants around a position, nearest first
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Search radius in meters (defaults to `RESTOLOVER_NEARBY_RADIUS_M`)
        #[arg(long)]
        radius_m: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("restolover-cli ready; run with --help to list commands");
        return Ok(());
    };

    match command {
        Commands::Parse { text } => {
            let keywords_path = std::env::var_os("RESTOLOVER_KEYWORDS_PATH").map(PathBuf::from);
            let tables = query::keyword_tables(keywords_path.as_deref())?;
            query::run_parse(&tables, &text.join(" "))?;
        }
        Commands::Migrate => {
            let (_, pool) = connect().await?;
            let applied = restolover_db::run_migrations(&pool).await?;
            println!("migrations complete ({applied} applied)");
        }
        Commands::SeedSpecialities => {
            let (config, pool) = connect().await?;
            let tables = query::keyword_tables(config.keywords_path.as_deref())?;
            let inserted = restolover_db::seed_specialities(&pool, &tables).await?;
            println!("specialities seeded ({inserted} inserted)");
        }
        Commands::Chat { text } => {
            let (config, pool) = connect().await?;
            let tables = query::keyword_tables(config.keywords_path.as_deref())?;
            query::run_chat(&pool, &tables, &text.join(" ")).await?;
        }
        Commands::Nearby { lat, lon, radius_m } => {
            let (config, pool) = connect().await?;
            let radius_m = radius_m.unwrap_or(config.nearby_default_radius_m);
            query::run_nearby(&pool, lat, lon, radius_m).await?;
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<(AppConfig, PgPool)> {
    let config = restolover_core::load_app_config()?;
    let pool_config = restolover_db::PoolConfig::from_app_config(&config);
    let pool = restolover_db::connect_pool(&config.database_url, pool_config).await?;
    Ok((config, pool))
}
