mod commands;
mod config;
mod controller;
mod coordinates;
mod db;
mod form;
mod geocoding;
mod model;
mod persistence;
mod repository;
mod store;
mod suggest;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::Config;

/// Plan a trip by dropping pins on a map
#[derive(Parser, Debug)]
#[command(name = "pinmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file, defaults to config.json in the platform config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add, edit, list and remove pins
    Pin {
        #[command(subcommand)]
        command: PinCommand,
    },

    /// Find a place and center the map on it
    Search { query: String },

    /// List matching places as they would appear while typing
    Suggest {
        query: String,

        /// Turn the n-th suggestion (1-based) into a pin. Pin options given
        /// here take precedence over the suggestion's name and coordinate
        #[arg(long)]
        add: Option<usize>,

        #[command(flatten)]
        fields: PinArgs,
    },

    /// Show or change the saved map view
    View {
        #[command(subcommand)]
        command: ViewCommand,
    },

    /// Serve pins, markers and the viewport to a map widget
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },

    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PinCommand {
    Add(PinArgs),
    List,
    Show {
        id: String,
    },
    /// Replace a pin's fields, omitted options keep their current value
    Edit {
        id: String,

        #[command(flatten)]
        fields: PinArgs,
    },
    Remove {
        id: String,
    },
}

#[derive(Args, Debug, Default)]
struct PinArgs {
    /// stay, eat or activity
    #[arg(long = "type")]
    pin_type: Option<String>,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Hex color such as #3498db
    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    link: Option<String>,

    /// "lat, lon" pair, as copied from a map
    #[arg(long, allow_hyphen_values = true)]
    coords: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    lon: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ViewCommand {
    Show,
    Set {
        #[arg(long, allow_hyphen_values = true)]
        lat: String,

        #[arg(long, allow_hyphen_values = true)]
        lon: String,

        #[arg(long)]
        zoom: Option<u8>,
    },
    /// Forget the saved view
    Reset,
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Delete the database file
    Drop,
}

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Pin { command } => match command {
            PinCommand::Add(fields) => commands::add_pin(&config, &fields),
            PinCommand::List => commands::list_pins(&config),
            PinCommand::Show { id } => commands::show_pin(&config, &id),
            PinCommand::Edit { id, fields } => commands::edit_pin(&config, &id, &fields),
            PinCommand::Remove { id } => commands::remove_pin(&config, &id),
        },
        Command::Search { query } => commands::search(&config, &query).await,
        Command::Suggest { query, add, fields } => {
            commands::suggest(&config, &query, add, &fields).await
        }
        Command::View { command } => match command {
            ViewCommand::Show => commands::show_view(&config),
            ViewCommand::Set { lat, lon, zoom } => commands::set_view(&config, &lat, &lon, zoom),
            ViewCommand::Reset => commands::reset_view(&config),
        },
        Command::Serve { port } => commands::serve(config, port).await,
        Command::Db { command } => match command {
            DbCommand::Drop => db::drop(&config.db_path()?),
        },
    }
}
