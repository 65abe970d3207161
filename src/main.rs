#[cfg(debug_assertions)]
use std::io::Write;
use std::process;

#[cfg(debug_assertions)]
use chrono::Local;
use clap::Parser;
use env_logger::Builder;
use log::{debug, LevelFilter};

use pgslice::cli::Cli;
use pgslice::commands;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 로거 초기화
    setup_logger(cli.global.verbose);
    debug!("pgslice {} 시작: {:?}", env!("CARGO_PKG_VERSION"), cli.command);

    if let Err(e) = commands::run(cli).await {
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// 로거 설정 (RUST_LOG 가 있으면 우선 적용)
fn setup_logger(verbose: bool) {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::new();
    builder.filter(None, level);

    #[cfg(debug_assertions)]
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {} {}:{}] {}",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            record.level(),
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0),
            record.args()
        )
    });

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.init();
}
