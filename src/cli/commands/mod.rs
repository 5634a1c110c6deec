//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod check;
pub mod order;
pub mod records;

use anyhow::Result;
use clap::Subcommand;

use crate::config::defaults;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build components and their dependencies
    Build {
        /// Components to build (all declared components if omitted)
        components: Vec<String>,

        /// Number of parallel build workers
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Print the dependency-resolved build order
    Order {
        /// Components to resolve (full graph if omitted)
        components: Vec<String>,
    },

    /// Validate the manifest and component recipes without building
    Check,

    /// Inspect and maintain recorded build history
    Records {
        #[command(subcommand)]
        command: RecordsCommands,
    },
}

/// Build-history subcommands
#[derive(Subcommand, Debug)]
pub enum RecordsCommands {
    /// List build records, newest first
    List {
        /// Restrict to one component
        component: Option<String>,
    },

    /// Apply the retention policy to successful records
    Prune {
        /// Successful records to keep per component
        #[arg(long, default_value_t = defaults::RECORD_RETENTION)]
        keep: usize,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, json: bool) -> Result<()> {
        let current_dir = std::env::current_dir()?;
        match self {
            Self::Build { components, jobs } => {
                let options = build::BuildCliOptions {
                    components,
                    jobs,
                    json,
                };
                build::execute(&current_dir, options).await
            }
            Self::Order { components } => order::execute(&current_dir, &components, json).await,
            Self::Check => check::execute(&current_dir).await,
            Self::Records { command } => match command {
                RecordsCommands::List { component } => {
                    records::execute_list(&current_dir, component.as_deref(), json).await
                }
                RecordsCommands::Prune { keep } => {
                    records::execute_prune(&current_dir, keep).await
                }
            },
        }
    }
}
