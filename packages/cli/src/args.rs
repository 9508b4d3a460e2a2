use std::path::PathBuf;

use clap::{Parser, Subcommand};

use repotree_core::OutputFormat;

/// Repotree - reconcile nodes of a remote content tree
#[derive(Parser, Debug)]
#[command(name = "repotree")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Instance base URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[arg(long, global = true)]
    pub user: Option<String>,

    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Output format: text, json or yaml
    #[arg(long, short, global = true)]
    pub output: Option<OutputFormat>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show a node and its properties
    Read { path: String },

    /// Make a node carry the given properties, writing only when needed
    Save {
        path: String,

        /// Property assignment `name=value`; repeatable
        #[arg(short = 'p', long = "prop", value_name = "NAME=VALUE")]
        props: Vec<String>,

        /// Properties as a JSON object
        #[arg(long, value_name = "JSON")]
        props_json: Option<String>,
    },

    /// Delete a node
    Delete {
        path: String,

        /// Succeed without changes when the node is already absent
        #[arg(long)]
        if_exists: bool,
    },

    /// Set a single property
    PropSave {
        path: String,
        name: String,
        value: String,
    },

    /// Remove a single property
    PropDelete { path: String, name: String },

    /// List every node below a path, depth first
    Tree { path: String },

    /// List the parents of a path up to the root
    Parents { path: String },
}
