//! CLI commands and argument parsing

use crate::types::Method;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// WeCom API command-line client
#[derive(Parser, Debug)]
#[command(name = "wecom")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enterprise id, overrides the config file and WECOM_CORP_ID
    #[arg(long, global = true)]
    pub corp_id: Option<String>,

    /// Application secret, overrides the config file and WECOM_CORP_SECRET
    #[arg(long, global = true)]
    pub corp_secret: Option<String>,

    /// API host, overrides the config file and WECOM_BASE_URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Maximum sends per call while the access token is rejected
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Exchange the credentials for an access token
    Token,

    /// Show a member
    GetMember {
        /// Member id
        userid: String,
    },

    /// Delete a member
    DeleteMember {
        /// Member id
        userid: String,
    },

    /// Invite members to join
    Invite {
        /// Member ids
        #[arg(required = true)]
        userids: Vec<String>,
    },

    /// List a department and its sub-departments
    Departments {
        /// Root department id
        #[arg(long, default_value = "1")]
        id: i64,
    },

    /// Call an arbitrary endpoint
    Call {
        /// HTTP method
        method: Method,

        /// API path, e.g. /cgi-bin/user/get
        path: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_parser = parse_key_value)]
        query: Vec<(String, String)>,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },
}

/// Parse a `key=value` pair
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
