use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pulpit")]
#[command(about = "Manage a published sermon collection", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the local store file (defaults to the user data dir,
    /// or PULPIT_STORE)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the sermon collection
    #[command(alias = "ls")]
    List,

    /// Add or update a sermon
    Add {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        preacher: String,

        #[arg(long, default_value = "Sunday Service")]
        series: String,

        /// ISO date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,

        #[arg(long, default_value = "")]
        scripture: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        audio_url: String,

        /// Repeatable: --tag Faith --tag Hope
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Update an existing sermon instead of creating a new one
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a sermon by id
    #[command(alias = "rm")]
    Delete {
        id: String,
    },

    /// Restore the collection from a JSON backup file
    Import {
        file: PathBuf,
    },

    /// Write the collection to a JSON backup file
    Export {
        /// Output path; defaults to a dated filename in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
