use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use costbench_core::{BackendType, CostMilestone, Strategy, WcType};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Construction cost benchmarking")]
pub struct Cli {
    /// Project catalog file (YAML or JSON); the built-in catalog by default
    #[clap(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Saved-selection store (.yaml, .json or .db)
    #[clap(long, global = true)]
    pub store: Option<PathBuf>,

    /// Config file; overrides COSTBENCH_CONFIG
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Search term matched against project name or number
    #[clap(long, short = 's')]
    pub search: Option<String>,

    /// Sector tags (comma-separated)
    #[clap(long, value_delimiter = ',')]
    pub sector: Vec<String>,

    /// Scope tags (comma-separated)
    #[clap(long, value_delimiter = ',')]
    pub scope: Vec<String>,

    /// Location tags (comma-separated)
    #[clap(long, value_delimiter = ',')]
    pub location: Vec<String>,

    /// Client ids (comma-separated)
    #[clap(long, value_delimiter = ',')]
    pub client: Vec<String>,

    /// Minimum cost per ft²
    #[clap(long)]
    pub cost_min: Option<f64>,

    /// Maximum cost per ft²
    #[clap(long)]
    pub cost_max: Option<f64>,

    /// Minimum area in ft²
    #[clap(long)]
    pub size_min: Option<f64>,

    /// Maximum area in ft²
    #[clap(long)]
    pub size_max: Option<f64>,

    #[clap(long)]
    pub reception_min: Option<f64>,

    #[clap(long)]
    pub reception_max: Option<f64>,

    #[clap(long)]
    pub wc_min: Option<f64>,

    #[clap(long)]
    pub wc_max: Option<f64>,

    /// WC types (superloo-only, cubicle-only, combined)
    #[clap(long, value_delimiter = ',')]
    pub wc_type: Vec<WcType>,

    /// Latest cost milestones (e.g. cost-model-2, final-account)
    #[clap(long, value_delimiter = ',')]
    pub latest_data: Vec<CostMilestone>,

    /// Earliest base date (YYYY-MM-DD)
    #[clap(long)]
    pub from: Option<NaiveDate>,

    /// Latest base date (YYYY-MM-DD)
    #[clap(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Project ids or numbers to select (comma-separated)
    #[clap(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Primary project id or number
    #[clap(long)]
    pub primary: Option<String>,

    /// Start from a saved selection (id or name)
    #[clap(long)]
    pub load: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DisplayArgs {
    /// Show areas and costs in metric units
    #[clap(long)]
    pub metric: bool,

    /// Hide project names behind their numbers
    #[clap(long)]
    pub confidential: bool,

    /// Use costs as recorded at each project's base date
    #[clap(long)]
    pub base_date: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List projects passing the filters, selected first
    List {
        #[clap(flatten)]
        filters: FilterArgs,

        #[clap(flatten)]
        selection: SelectionArgs,

        #[clap(flatten)]
        display: DisplayArgs,

        /// Number of "load more" steps to apply
        #[clap(long, default_value_t = 0)]
        more: usize,
    },

    /// Show details for a project
    Show {
        /// Project id or number
        id: String,

        #[clap(flatten)]
        display: DisplayArgs,
    },

    /// Rank projects similar to a primary project
    Similar {
        /// Primary project id or number
        primary: String,

        /// Strategy: default, reception or wc
        #[clap(long, default_value = "default")]
        strategy: Strategy,

        /// Rank under every strategy
        #[clap(long)]
        all: bool,

        /// Also list the candidates each strategy leaves out, with the reason
        #[clap(long)]
        explain: bool,

        /// Candidates to toggle into the selection (comma-separated)
        #[clap(long, value_delimiter = ',')]
        accept: Vec<String>,

        /// Save the resulting selection under this name
        #[clap(long)]
        save: Option<String>,

        /// Other project ids or numbers to select (comma-separated)
        #[clap(long, value_delimiter = ',')]
        select: Vec<String>,

        /// Start from a saved selection (id or name)
        #[clap(long)]
        load: Option<String>,

        #[clap(flatten)]
        display: DisplayArgs,
    },

    /// Show the resolved filter set and the available tags
    Filters {
        #[clap(flatten)]
        filters: FilterArgs,
    },

    /// Saved selections
    #[clap(subcommand)]
    Selection(SelectionCommand),

    /// Configuration
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum SelectionCommand {
    /// Save a selection under a name
    Save {
        /// Name for the selection (prompted when omitted)
        name: Option<String>,

        /// Optional description
        #[clap(long)]
        description: Option<String>,

        #[clap(flatten)]
        selection: SelectionArgs,
    },

    /// List saved selections
    List,

    /// Show the projects in a saved selection
    Load {
        /// Selection id or name
        key: String,

        #[clap(flatten)]
        display: DisplayArgs,
    },

    /// Delete a saved selection
    Delete {
        /// Selection id or name
        key: String,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Copy every saved selection into another store
    Migrate {
        /// Target store path
        #[clap(long)]
        to: PathBuf,

        /// Target backend; inferred from the extension when omitted
        #[clap(long)]
        backend: Option<BackendType>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective configuration
    Show,
}
