// 배치 단위 행 복사 (fill)
// 기본 키 구간을 겹치지 않게 나누어 한 배치씩 자동 커밋으로 복사합니다.

use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::db::catalog::{Catalog, TimeBound};
use crate::db::executor::{log_sql, Session, StatementExecutor};
use crate::db::quote::{quote_columns, quote_ident};
use crate::error::{Result, SliceError};
use crate::partition::period::{advance, partition_date, sql_date};
use crate::partition::settings::{fetch_settings, Cast};
use crate::table::TableRef;

/// fill 옵션
#[derive(Debug, Clone)]
pub struct FillOptions {
    pub table: TableRef,
    /// 스왑 이후 역방향 복사 (retired -> table)
    pub swapped: bool,
    pub source_table: Option<TableRef>,
    pub dest_table: Option<TableRef>,
    pub batch_size: i64,
    /// 명시적 재개 지점 (이 ID 초과부터 복사)
    pub start: Option<i64>,
    /// 추가 WHERE 조건
    pub filter: Option<String>,
    /// 배치 사이 대기 시간
    pub sleep: Option<Duration>,
}

/// fill 결과 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillSummary {
    pub batches: u64,
    pub rows: u64,
    pub low: i64,
    pub high: i64,
}

/// 복사 구간 하나 (start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pub index: u64,
    pub start: i64,
    pub end: i64,
}

/// 복사 진행 커서 - 상한은 시작 시 고정, 하한은 배치마다 증가
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillCursor {
    pub low: i64,
    pub high: i64,
    pub batch_size: i64,
}

impl BackfillCursor {
    pub fn new(low: i64, high: i64, batch_size: i64) -> Result<Self> {
        if batch_size <= 0 {
            return Err(SliceError::Usage(format!(
                "batch size must be positive, got {}",
                batch_size
            )));
        }
        Ok(Self {
            low,
            high,
            batch_size,
        })
    }

    /// ceil((high - low) / batch_size), 빈 구간이면 0
    pub fn batch_count(&self) -> u64 {
        if self.high <= self.low {
            return 0;
        }
        let span = (self.high as i128) - (self.low as i128);
        let size = self.batch_size as i128;
        ((span + size - 1) / size) as u64
    }

    /// 오름차순 배치 목록, 마지막 배치의 상한은 high 로 고정
    pub fn batches(&self) -> impl Iterator<Item = Batch> + '_ {
        let total = self.batch_count();
        (0..total).map(move |i| {
            let start = self.low.saturating_add((i as i64).saturating_mul(self.batch_size));
            let end = start.saturating_add(self.batch_size).min(self.high);
            Batch {
                index: i + 1,
                start,
                end,
            }
        })
    }
}

/// 파티션 범위로 제한되는 시간 구간 [start, end)
#[derive(Debug, Clone, PartialEq, Eq)]
struct TimeWindow {
    column: String,
    cast: Cast,
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeWindow {
    fn condition(&self) -> String {
        let column = quote_ident(&self.column);
        format!(
            "{} >= {} AND {} < {}",
            column,
            sql_date(self.start, self.cast, true),
            column,
            sql_date(self.end, self.cast, true)
        )
    }
}

/// 원본에서 대상으로 행 복사
///
/// 배치는 각각 독립적으로 커밋되며, 실패 시 이전 배치는 유지되고
/// 재개 지점이 담긴 `BatchFailed` 오류를 반환합니다.
pub async fn fill<D>(session: &mut Session<D>, options: &FillOptions) -> Result<FillSummary>
where
    D: Catalog + StatementExecutor,
{
    let table = &options.table;
    let (default_source, default_dest) = if options.swapped {
        (table.retired(), table.clone())
    } else {
        (table.clone(), table.intermediate())
    };
    let source = options.source_table.clone().unwrap_or(default_source);
    let dest = options.dest_table.clone().unwrap_or(default_dest);

    let db = session.db();

    for t in [&source, &dest] {
        if !db.table_exists(t).await? {
            return Err(SliceError::TableNotFound(t.full_name()));
        }
    }

    let settings = fetch_settings(db, table, &dest).await?;
    let dest_partitions = match &settings {
        Some(_) => db.partitions(&dest).await?,
        None => Vec::new(),
    };

    let window = match (&settings, dest_partitions.first(), dest_partitions.last()) {
        (Some(settings), Some(first), Some(last)) => Some(TimeWindow {
            column: settings.column.clone(),
            cast: settings.cast,
            start: partition_date(&first.name, settings.period)?,
            end: advance(partition_date(&last.name, settings.period)?, settings.period, 1)?,
        }),
        _ => None,
    };

    let schema_table = match &settings {
        Some(settings) if settings.is_declarative() => dest_partitions
            .last()
            .cloned()
            .ok_or_else(|| SliceError::NoPartitions(dest.full_name()))?,
        _ => table.clone(),
    };

    let primary_key = db
        .primary_key(&schema_table)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| SliceError::NoPrimaryKey(schema_table.full_name()))?;

    let filter = options.filter.as_deref().map(|f| format!("({})", f));

    let Some(high) = db.max_id(&source, &primary_key, None, None).await? else {
        info!("원본 테이블이 비어 있음: {}", source);
        log_sql("/* nothing to fill */");
        return Ok(FillSummary::default());
    };

    let low = if let Some(start) = options.start {
        start
    } else if options.swapped {
        db.max_id(&dest, &primary_key, Some(high), filter.as_deref())
            .await?
            .unwrap_or(0)
    } else {
        match db.max_id(&dest, &primary_key, None, filter.as_deref()).await? {
            Some(max) => max,
            None => {
                let since = window.as_ref().map(|w| TimeBound {
                    column: w.column.clone(),
                    since: w.start,
                    cast: w.cast,
                });
                match db
                    .min_id(&source, &primary_key, since.as_ref(), filter.as_deref())
                    .await?
                {
                    Some(min) => min - 1,
                    None => high,
                }
            }
        }
    };

    let fields = quote_columns(&db.columns(&source).await?);
    let cursor = BackfillCursor::new(low, high, options.batch_size)?;
    let total = cursor.batch_count();

    info!(
        "fill 시작: {} -> {} (기본 키 {}, 구간 {}..{}, 배치 {} 개)",
        source, dest, primary_key, low, high, total
    );

    if total == 0 {
        log_sql("/* nothing to fill */");
        return Ok(FillSummary {
            batches: 0,
            rows: 0,
            low,
            high,
        });
    }

    let pk = quote_ident(&primary_key);
    let mut rows = 0;

    for batch in cursor.batches() {
        let mut conditions = vec![format!("{} > {} AND {} <= {}", pk, batch.start, pk, batch.end)];
        if let Some(window) = &window {
            conditions.push(window.condition());
        }
        if let Some(filter) = &filter {
            conditions.push(filter.clone());
        }

        let statement = format!(
            "/* {} of {} */\nINSERT INTO {} ({})\n    SELECT {} FROM {}\n    WHERE {}",
            batch.index,
            total,
            dest.quoted(),
            fields,
            fields,
            source.quoted(),
            conditions.join(" AND ")
        );

        match session.run_query(&statement).await {
            Ok(copied) => {
                rows += copied;
                debug!("배치 {}/{} 완료: {} 행", batch.index, total, copied);
            }
            Err(e) => {
                warn!("배치 {}/{} 실패, --start {} 로 재개 가능", batch.index, total, batch.start);
                return Err(SliceError::BatchFailed {
                    batch: batch.index,
                    total,
                    start: batch.start,
                    end: batch.end,
                    source: Box::new(e),
                });
            }
        }

        if let Some(sleep) = options.sleep.filter(|d| !d.is_zero()) {
            if batch.index < total && !session.is_dry_run() {
                debug!("다음 배치까지 대기: {}", humantime::format_duration(sleep));
                tokio::time::sleep(sleep).await;
            }
        }
    }

    let summary = FillSummary {
        batches: total,
        rows,
        low,
        high,
    };
    info!(
        "fill 완료: {} -> {} ({} 배치, {} 행)",
        source, dest, summary.batches, summary.rows
    );
    Ok(summary)
}
