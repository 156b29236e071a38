use crate::export::ExportFormat;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "jarrones")]
#[command(about = "Six-jar monthly budgeting ledger", long_about = None)]
pub struct Cli {
    /// Override the jarrones home directory (config/data subdirs will be created inside it).
    #[arg(long, env = "JARRONES_HOME")]
    pub home: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the jars, their share of income and their subcategories.
    Jars,
    Session(SessionArgs),
    /// Record an expense against a jar.
    Add(AddArgs),
    /// Show budget, assigned and remaining amounts per jar.
    Status,
    /// Merge the session into the history (replacing its month) and print the summaries.
    Save,
    History(HistoryArgs),
    /// Write the history to a file.
    Export(ExportArgs),
}

#[derive(Debug, Subcommand)]
pub enum SessionCmd {
    /// Start a new month. Discards any unsaved expenses.
    New {
        /// Total monthly income (comma or dot as decimal separator).
        #[arg(allow_hyphen_values = true)]
        income: String,
        #[arg(long)]
        month: String,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Change income or period, keeping recorded expenses.
    Edit {
        #[arg(long, allow_hyphen_values = true)]
        income: Option<String>,
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        year: Option<i32>,
    },
    Show,
    Reset,
}

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub cmd: SessionCmd,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Jar name or alias (basicos, largo-plazo, educacion, invertir, diversion, donar).
    pub jar: String,
    pub subcategory: String,
    #[arg(allow_hyphen_values = true)]
    pub amount: String,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCmd {
    /// Every persisted row.
    Show,
    Monthly {
        /// Include one column per jar.
        #[arg(long)]
        detail: bool,
    },
    Annual {
        #[arg(long)]
        detail: bool,
    },
    /// Delete the history file and the current session.
    Clear,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub cmd: HistoryCmd,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    pub path: std::path::PathBuf,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,
}
