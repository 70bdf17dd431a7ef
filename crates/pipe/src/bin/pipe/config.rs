use std::path::PathBuf;

use clap::Parser;
use pipe_common::consts::VERSION;
use pipe_storage::JournalMode;

#[derive(Parser)]
#[command(name = "Pipe")]
#[command(author = "b3log.org")]
#[command(version = VERSION)]
#[command(
    about = "A small and beautiful blogging platform. Submit bug reports and issues at https://github.com/b3log/pipe."
)]
struct Cli {
    #[arg(
        long,
        value_name = "DIR",
        value_hint = clap::ValueHint::DirPath,
        long_help = "Directory where pipe should store its data",
        env = "PIPE_DATA_DIRECTORY",
        default_value_os_t = (&std::path::Component::CurDir).into()
    )]
    data_directory: PathBuf,

    #[arg(
        long = "sqlite-wal",
        long_help = "Enable SQLite write-ahead logging",
        action = clap::ArgAction::Set,
        default_value = "true",
        env = "PIPE_SQLITE_WAL",
    )]
    sqlite_wal: bool,

    #[arg(
        long = "initialize",
        long_help = "Install the platform if the database has not been initialized yet",
        action = clap::ArgAction::Set,
        default_value = "false",
        env = "PIPE_INITIALIZE",
    )]
    initialize: bool,
}

pub struct Config {
    pub data_directory: PathBuf,
    pub sqlite_wal: JournalMode,
    pub initialize: bool,
}

impl Config {
    pub fn parse() -> Self {
        Self::from(Cli::parse())
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            data_directory: cli.data_directory,
            sqlite_wal: match cli.sqlite_wal {
                true => JournalMode::WAL,
                false => JournalMode::Rollback,
            },
            initialize: cli.initialize,
        }
    }
}
