//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for grounded
#[derive(Parser, Debug)]
#[command(name = "grounded")]
#[command(author, version, about = "Grounded question answering over a hybrid document index")]
#[command(long_about = r#"
Grounded answers questions from an indexed document collection only.

Each question goes through four steps:
1. Contextualize: follow-ups are rewritten into standalone questions
2. Retrieve: dense and keyword search run together against the index
3. Answer: the model answers from the retrieved passages only
4. Remember: the exchange is added to the session history

Configuration files are loaded from (in priority order):
1. GROUNDED_* environment variables (e.g. GROUNDED_LLM__MODEL)
2. --config <path>     Explicit config file
3. ./grounded.toml     Project-level config
4. ~/.config/grounded/config.toml   Global config

Credentials are read from OPENAI_API_KEY and PINECONE_API_KEY, and the index
from PINECONE_INDEX_NAME, unless set in the config file.

Example:
  grounded "What is the maximum tenor for an SME term loan?"
  grounded --session 6f1c... "And for secured loans?"
  grounded --chat --show-sources
"#)]
pub struct Cli {
    /// The question to ask (not required in chat mode)
    pub question: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Continue an existing session
    #[arg(short, long, value_name = "ID")]
    pub session: Option<String>,

    /// List the passages each answer was grounded on
    #[arg(long)]
    pub show_sources: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and the effective configuration, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write diagnostics to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
