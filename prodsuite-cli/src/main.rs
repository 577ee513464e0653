mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use prodsuite_core::SuiteConfig;
use prodsuite_core::reminder::Frequency;

#[derive(Parser)]
#[command(name = "prodsuite")]
#[command(about = "Maintain a prodsuite database: users, permissions and reminders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect users and manage administrators
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Default feature permissions for new and default-following users
    Defaults {
        #[command(subcommand)]
        action: DefaultsAction,
    },
    /// Check a reminder and list when it would fire
    Reminder {
        /// First occurrence: RFC 3339, "YYYY-MM-DD HH:MM" or a duration from now ("2h")
        #[arg(long)]
        at: String,

        /// Repeat daily, weekly or monthly
        #[arg(long, value_parser = parse_frequency)]
        every: Option<Frequency>,

        #[arg(long, default_value_t = 1)]
        interval: u32,

        /// Weekdays for weekly reminders, 0 = Sunday (e.g. "1,3,5")
        #[arg(long, value_delimiter = ',')]
        days: Vec<u8>,

        /// Last possible occurrence, same formats as --at
        #[arg(long)]
        until: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location and resolved paths
    Path,
    /// Print the resolved configuration as JSON
    Show,
    /// Write a commented-out config file if none exists
    Init,
}

#[derive(Subcommand)]
enum UsersAction {
    List {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    Show {
        user_id: String,
    },
    /// Make a user an administrator
    GrantAdmin {
        user_id: String,
    },
    /// Remove a user's administrator flag
    RevokeAdmin {
        user_id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DefaultsAction {
    Show,
    /// Replace the default denied features (none to allow everything)
    Set {
        features: Vec<String>,
    },
    /// Put every non-admin user back on the defaults
    Apply {
        #[arg(short, long)]
        yes: bool,
    },
}

fn parse_frequency(raw: &str) -> Result<Frequency, String> {
    match raw {
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "monthly" => Ok(Frequency::Monthly),
        _ => Err(format!("expected daily, weekly or monthly, got '{raw}'")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::path(),
            ConfigAction::Show => commands::config::show(&SuiteConfig::load()?),
            ConfigAction::Init => commands::config::init(),
        },
        Commands::Users { action } => {
            let storage = commands::open_storage(&SuiteConfig::load()?)?;
            match action {
                UsersAction::List {
                    search,
                    page,
                    limit,
                } => commands::users::list(&storage, search, page, limit),
                UsersAction::Show { user_id } => commands::users::show(&storage, &user_id),
                UsersAction::GrantAdmin { user_id } => {
                    commands::users::set_admin(&storage, &user_id, true, true)
                }
                UsersAction::RevokeAdmin { user_id, yes } => {
                    commands::users::set_admin(&storage, &user_id, false, yes)
                }
            }
        }
        Commands::Defaults { action } => {
            let storage = commands::open_storage(&SuiteConfig::load()?)?;
            match action {
                DefaultsAction::Show => commands::defaults::show(&storage),
                DefaultsAction::Set { features } => commands::defaults::set(&storage, &features),
                DefaultsAction::Apply { yes } => commands::defaults::apply(&storage, yes),
            }
        }
        Commands::Reminder {
            at,
            every,
            interval,
            days,
            until,
        } => {
            let config = SuiteConfig::load()?;
            let args = commands::reminder::PreviewArgs {
                at,
                every,
                interval,
                days,
                until,
            };
            commands::reminder::run(args, &config.timezone)
        }
    }
}
