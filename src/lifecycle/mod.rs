// 테이블 상태 전환 (prep / swap / unswap / unprep) 및 통계 갱신 (analyze)
// 각 전환은 전제 조건을 모두 확인한 뒤 하나의 트랜잭션으로 실행됩니다.

use std::time::Duration;

use log::{debug, info};

use crate::constants::{
    DECLARATIVE_MIN_VERSION, INDEX_PROPAGATION_MIN_VERSION, LOCK_TIMEOUT_MIN_VERSION,
    ROUTING_PLACEHOLDER_MESSAGE,
};
use crate::db::catalog::Catalog;
use crate::db::executor::{Session, StatementExecutor};
use crate::db::quote::{quote_ident, quote_literal};
use crate::error::{Result, SliceError};
use crate::partition::period::Period;
use crate::partition::settings::{PartitionSettings, Strategy};
use crate::table::TableRef;

/// prep 옵션
#[derive(Debug, Clone)]
pub struct PrepOptions {
    pub table: TableRef,
    pub column: Option<String>,
    pub period: Option<String>,
    /// false 면 파티션 없는 복제 테이블만 생성 (--no-partition)
    pub partition: bool,
    pub trigger_based: bool,
}

/// --lock-timeout 값 해석 (예: 5s, 500ms, 1m)
pub fn parse_lock_timeout(value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| SliceError::InvalidDuration(format!("{}: {}", value, e)))
}

async fn require_exists<C: Catalog + ?Sized>(catalog: &C, table: &TableRef) -> Result<()> {
    if catalog.table_exists(table).await? {
        Ok(())
    } else {
        Err(SliceError::TableNotFound(table.full_name()))
    }
}

async fn require_absent<C: Catalog + ?Sized>(catalog: &C, table: &TableRef) -> Result<()> {
    if catalog.table_exists(table).await? {
        Err(SliceError::TableExists(table.full_name()))
    } else {
        Ok(())
    }
}

/// 중간 테이블 생성 및 파티셔닝 설정 기록
///
/// 파티셔닝한 경우 기록된 설정을 반환합니다.
pub async fn prep<D>(session: &mut Session<D>, options: &PrepOptions) -> Result<Option<PartitionSettings>>
where
    D: Catalog + StatementExecutor,
{
    if !options.partition {
        if options.column.is_some() || options.period.is_some() {
            return Err(SliceError::Usage("pgslice prep TABLE --no-partition".to_string()));
        }
        if options.trigger_based {
            return Err(SliceError::Usage(
                "Can't use --trigger-based and --no-partition".to_string(),
            ));
        }
    }

    let table = &options.table;
    let intermediate = table.intermediate();
    let db = session.db();

    require_exists(db, table).await?;
    require_absent(db, &intermediate).await?;

    let target = if options.partition {
        let (Some(column), Some(period)) = (&options.column, &options.period) else {
            return Err(SliceError::Usage("pgslice prep TABLE COLUMN PERIOD".to_string()));
        };

        if !db.columns(table).await?.iter().any(|c| c == column) {
            return Err(SliceError::ColumnNotFound(column.clone()));
        }
        Some((column.clone(), period.parse::<Period>()?))
    } else {
        None
    };

    let version = db.server_version_num().await?;
    let declarative = version >= DECLARATIVE_MIN_VERSION && !options.trigger_based;

    let settings = match &target {
        Some((column, period)) => Some(PartitionSettings {
            column: column.clone(),
            period: *period,
            cast: db.column_cast(table, column).await?,
            strategy: if declarative {
                Strategy::Declarative
            } else {
                Strategy::Trigger
            },
        }),
        None => None,
    };

    let mut queries = Vec::new();

    match &settings {
        Some(settings) if settings.is_declarative() => {
            queries.push(format!(
                "CREATE TABLE {} (LIKE {} INCLUDING DEFAULTS INCLUDING CONSTRAINTS INCLUDING STORAGE INCLUDING COMMENTS) PARTITION BY RANGE ({});",
                intermediate.quoted(),
                table.quoted(),
                quote_ident(&settings.column)
            ));

            // PG 11 부터 부모 인덱스가 파티션에 전파됨
            if version >= INDEX_PROPAGATION_MIN_VERSION {
                for index in db.index_defs(table).await? {
                    queries.push(index.render(&intermediate));
                }
            }

            queries.push(format!(
                "COMMENT ON TABLE {} IS {};",
                intermediate.quoted(),
                quote_literal(&settings.encode())
            ));
        }
        _ => {
            queries.push(format!(
                "CREATE TABLE {} (LIKE {} INCLUDING ALL);",
                intermediate.quoted(),
                table.quoted()
            ));

            for fk in db.foreign_keys(table).await? {
                queries.push(fk.render(&intermediate));
            }
        }
    }

    if let Some(settings) = settings.as_ref().filter(|s| !s.is_declarative()) {
        let function = table.trigger_function();
        let trigger = quote_ident(&table.trigger_name());

        queries.push(format!(
            "CREATE FUNCTION {}()
    RETURNS trigger AS $$
    BEGIN
        RAISE EXCEPTION '{}';
    END;
    $$ LANGUAGE plpgsql;",
            function, ROUTING_PLACEHOLDER_MESSAGE
        ));

        queries.push(format!(
            "CREATE TRIGGER {}\n    BEFORE INSERT ON {}\n    FOR EACH ROW EXECUTE PROCEDURE {}();",
            trigger,
            intermediate.quoted(),
            function
        ));

        queries.push(format!(
            "COMMENT ON TRIGGER {} ON {} IS {};",
            trigger,
            intermediate.quoted(),
            quote_literal(&settings.encode())
        ));
    }

    session.run_queries(&queries).await?;
    info!("중간 테이블 생성: {} ({:?})", intermediate, settings);

    Ok(settings)
}

/// 이름 교환 구문 + 시퀀스 소유권 재지정, 지원 시 lock_timeout 선행
async fn rename_queries<C: Catalog + ?Sized>(
    catalog: &C,
    table: &TableRef,
    renames: [(&TableRef, &TableRef); 2],
    lock_timeout: Duration,
) -> Result<Vec<String>> {
    let mut queries = Vec::new();

    if catalog.server_version_num().await? >= LOCK_TIMEOUT_MIN_VERSION {
        debug!("lock_timeout: {}", humantime::format_duration(lock_timeout));
        queries.push(format!(
            "SET LOCAL lock_timeout = '{}ms';",
            lock_timeout.as_millis()
        ));
    }

    // 시퀀스는 이름 변경 전 테이블 기준으로 조회
    let sequences = catalog.sequences(table).await?;

    for (from, to) in renames {
        queries.push(format!("ALTER TABLE {} RENAME TO {};", from.quoted(), to.quoted_name()));
    }

    for sequence in sequences {
        queries.push(format!(
            "ALTER SEQUENCE {} OWNED BY {}.{};",
            sequence.quoted(),
            table.quoted(),
            quote_ident(&sequence.column)
        ));
    }

    Ok(queries)
}

/// 중간 테이블을 운영 테이블로 교체 (기존 테이블은 retired)
pub async fn swap<D>(session: &mut Session<D>, table: &TableRef, lock_timeout: Duration) -> Result<()>
where
    D: Catalog + StatementExecutor,
{
    let intermediate = table.intermediate();
    let retired = table.retired();
    let db = session.db();

    require_exists(db, table).await?;
    require_exists(db, &intermediate).await?;
    require_absent(db, &retired).await?;

    let queries = rename_queries(db, table, [(table, &retired), (&intermediate, table)], lock_timeout).await?;

    session.run_queries(&queries).await?;
    info!("스왑 완료: {} -> {}, {} -> {}", table, retired, intermediate, table);
    Ok(())
}

/// swap 되돌리기 (현재 테이블은 다시 중간 테이블로)
pub async fn unswap<D>(session: &mut Session<D>, table: &TableRef, lock_timeout: Duration) -> Result<()>
where
    D: Catalog + StatementExecutor,
{
    let intermediate = table.intermediate();
    let retired = table.retired();
    let db = session.db();

    require_exists(db, table).await?;
    require_exists(db, &retired).await?;
    require_absent(db, &intermediate).await?;

    let queries = rename_queries(db, table, [(table, &intermediate), (&retired, table)], lock_timeout).await?;

    session.run_queries(&queries).await?;
    info!("언스왑 완료: {} -> {}, {} -> {}", table, intermediate, retired, table);
    Ok(())
}

/// 중간 테이블과 라우팅 함수 삭제
pub async fn unprep<D>(session: &mut Session<D>, table: &TableRef) -> Result<()>
where
    D: Catalog + StatementExecutor,
{
    let intermediate = table.intermediate();
    require_exists(session.db(), &intermediate).await?;

    let queries = vec![
        format!("DROP TABLE {} CASCADE;", intermediate.quoted()),
        format!("DROP FUNCTION IF EXISTS {}();", table.trigger_function()),
    ];

    session.run_queries(&queries).await?;
    info!("중간 테이블 삭제: {}", intermediate);
    Ok(())
}

/// 파티션과 부모 테이블 통계 갱신 (트랜잭션 없이)
///
/// 스왑 전에는 중간 테이블, 스왑 후에는 운영 테이블이 부모입니다.
pub async fn analyze<D>(session: &mut Session<D>, table: &TableRef, swapped: bool) -> Result<()>
where
    D: Catalog + StatementExecutor,
{
    let parent = if swapped {
        table.clone()
    } else {
        table.intermediate()
    };

    let db = session.db();
    require_exists(db, &parent).await?;

    let mut targets = db.partitions(&parent).await?;
    targets.push(parent.clone());

    let queries: Vec<String> = targets
        .iter()
        .map(|t| format!("ANALYZE VERBOSE {};", t.quoted()))
        .collect();

    session.run_queries_without_transaction(&queries).await?;
    info!("통계 갱신 완료: {} ({} 개 테이블)", parent, queries.len());
    Ok(())
}
