// 명령줄 인자 정의

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_LOCK_TIMEOUT};

#[derive(Debug, Parser)]
#[command(name = "pgslice")]
#[command(about = "Postgres partitioning as easy as pie", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

/// 모든 하위 명령에 공통인 옵션
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Database URL (takes precedence over PGSLICE_URL and the config file)
    #[arg(long, global = true)]
    pub url: Option<String>,
    /// YAML connection file (default: PGSLICE_CONFIG or ./pgslice.yml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Print statements without executing them
    #[arg(long, global = true, default_value_t = false)]
    pub dry_run: bool,
    /// Debug-level logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an intermediate table for partitioning
    Prep {
        table: String,
        column: Option<String>,
        period: Option<String>,
        /// Don't partition the table
        #[arg(long, default_value_t = false)]
        no_partition: bool,
        /// Use trigger-based partitioning
        #[arg(long, default_value_t = false)]
        trigger_based: bool,
    },
    /// Add partitions
    #[command(name = "add_partitions")]
    AddPartitions {
        table: String,
        /// Add to intermediate table
        #[arg(long, default_value_t = false)]
        intermediate: bool,
        /// Number of past partitions to add
        #[arg(long, default_value_t = 0)]
        past: u32,
        /// Number of future partitions to add
        #[arg(long, default_value_t = 0)]
        future: u32,
    },
    /// Fill the partitions in batches
    Fill {
        table: String,
        /// Use swapped table
        #[arg(long, default_value_t = false)]
        swapped: bool,
        #[arg(long)]
        source_table: Option<String>,
        #[arg(long)]
        dest_table: Option<String>,
        /// Resume after this primary key
        #[arg(long)]
        start: Option<i64>,
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: i64,
        /// Extra condition appended to every batch
        #[arg(long = "where")]
        filter: Option<String>,
        /// Seconds to sleep between batches
        #[arg(long)]
        sleep: Option<u64>,
    },
    /// Analyze tables
    Analyze {
        table: String,
        /// Use swapped table
        #[arg(long, default_value_t = false)]
        swapped: bool,
    },
    /// Swap the intermediate table with the original table
    Swap {
        table: String,
        /// Lock timeout (e.g. 5s, 500ms)
        #[arg(long, default_value = DEFAULT_LOCK_TIMEOUT)]
        lock_timeout: String,
    },
    /// Undo swap
    Unswap {
        table: String,
        /// Lock timeout (e.g. 5s, 500ms)
        #[arg(long, default_value = DEFAULT_LOCK_TIMEOUT)]
        lock_timeout: String,
    },
    /// Undo prep
    Unprep { table: String },
}
