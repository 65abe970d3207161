// 하위 명령 실행 - 연결 설정 결정, 연결 생성, 각 작업으로 분기

use std::time::Duration;

use chrono::Utc;
use log::{debug, info};

use crate::cli::{Cli, Command};
use crate::db::config::DbConfig;
use crate::db::executor::Session;
use crate::db::pool;
use crate::error::Result;
use crate::fill::{fill, FillOptions};
use crate::lifecycle::{self, parse_lock_timeout, PrepOptions};
use crate::partition::manager::{add_partitions, AddPartitionsOptions};
use crate::table::TableRef;

/// 명령 실행
pub async fn run(cli: Cli) -> Result<()> {
    // 연결 전에 인자 오류를 먼저 확인
    let lock_timeout = match &cli.command {
        Command::Swap { lock_timeout, .. } | Command::Unswap { lock_timeout, .. } => {
            Some(parse_lock_timeout(lock_timeout)?)
        }
        _ => None,
    };

    let (db_config, source) = DbConfig::resolve(cli.global.url.as_deref(), cli.global.config.as_deref())?;
    debug!("연결 설정 출처: {:?}", source);

    let db = pool::connect(&db_config).await?;
    let mut session = Session::new(db, cli.global.dry_run);
    if session.is_dry_run() {
        info!("dry-run 모드: 구문을 출력만 합니다");
    }

    let lock_timeout = lock_timeout.unwrap_or(Duration::ZERO);

    match cli.command {
        Command::Prep {
            table,
            column,
            period,
            no_partition,
            trigger_based,
        } => {
            let options = PrepOptions {
                table: TableRef::parse(&table),
                column,
                period,
                partition: !no_partition,
                trigger_based,
            };
            lifecycle::prep(&mut session, &options).await?;
        }
        Command::AddPartitions {
            table,
            intermediate,
            past,
            future,
        } => {
            let options = AddPartitionsOptions {
                table: TableRef::parse(&table),
                intermediate,
                past,
                future,
            };
            add_partitions(&mut session, &options, Utc::now()).await?;
        }
        Command::Fill {
            table,
            swapped,
            source_table,
            dest_table,
            start,
            batch_size,
            filter,
            sleep,
        } => {
            let options = FillOptions {
                table: TableRef::parse(&table),
                swapped,
                source_table: source_table.as_deref().map(TableRef::parse),
                dest_table: dest_table.as_deref().map(TableRef::parse),
                batch_size,
                start,
                filter,
                sleep: sleep.map(Duration::from_secs),
            };
            fill(&mut session, &options).await?;
        }
        Command::Analyze { table, swapped } => {
            lifecycle::analyze(&mut session, &TableRef::parse(&table), swapped).await?;
        }
        Command::Swap { table, .. } => {
            lifecycle::swap(&mut session, &TableRef::parse(&table), lock_timeout).await?;
        }
        Command::Unswap { table, .. } => {
            lifecycle::unswap(&mut session, &TableRef::parse(&table), lock_timeout).await?;
        }
        Command::Unprep { table } => {
            lifecycle::unprep(&mut session, &TableRef::parse(&table)).await?;
        }
    }

    Ok(())
}
