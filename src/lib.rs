pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod models;
pub mod services;

use clap::{CommandFactory, Parser};
use cli::{
    Cli, Commands, cmd_add_book, cmd_books, cmd_borrow, cmd_describe, cmd_loans, cmd_recommend,
    cmd_reconcile, cmd_register, cmd_return, cmd_returns, cmd_whoami,
};
pub use config::Config;
use db::Store;
use services::NewBook;
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let cli = Cli::parse();
    let credentials = cli.credentials();

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Init => {
            let created = Config::create_default_if_missing()?;
            Store::open(&config).await?;
            if created {
                println!("✓ Config file created. Edit libris.toml and run again.");
            } else {
                println!("✓ Config file already exists.");
            }
            println!("Data directory: {}", config.data_dir().display());
            Ok(())
        }

        Commands::Register {
            username,
            password,
            picture,
        } => cmd_register(&config, username, password, picture.clone()).await,

        Commands::Whoami => cmd_whoami(&config, credentials).await,

        Commands::Books => cmd_books(&config).await,

        Commands::Borrow { book_id } => cmd_borrow(&config, credentials, book_id).await,

        Commands::Loans => cmd_loans(&config, credentials).await,

        Commands::Recommend { mood } => cmd_recommend(&config, &mood.join(" ")).await,

        Commands::Describe { title } => cmd_describe(&config, &title.join(" ")).await,

        Commands::AddBook {
            book_id,
            title,
            author,
            genre,
        } => {
            let book = NewBook {
                book_id: book_id.clone(),
                title: title.clone(),
                author: author.clone(),
                genre: genre.clone(),
            };
            cmd_add_book(&config, credentials, book).await
        }

        Commands::Returns => cmd_returns(&config, credentials).await,

        Commands::Return { username, book_id } => {
            cmd_return(&config, credentials, username, book_id).await
        }

        Commands::Reconcile => cmd_reconcile(&config, credentials).await,
    }
}
