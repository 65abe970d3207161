use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};

use crate::constants::INDEX_PROPAGATION_MIN_VERSION;
use crate::db::catalog::Catalog;
use crate::db::executor::{Session, StatementExecutor};
use crate::db::quote::quote_ident;
use crate::error::{Result, SliceError};
use crate::partition::period::{advance, partition_name, round_date, sql_date, Period};
use crate::partition::routing::RoutingRule;
use crate::partition::schema::SchemaTemplate;
use crate::partition::settings::{fetch_settings, PartitionSettings};
use crate::table::TableRef;

/// 파티션 하나 - 부모, 이름, [start, end) 구간
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    pub parent: TableRef,
    pub table: TableRef,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PartitionDescriptor {
    /// 이름은 항상 원본 테이블 기준 (중간 테이블에 붙일 때도 동일)
    pub fn new(original: &TableRef, parent: &TableRef, start: NaiveDate, period: Period) -> Result<Self> {
        Ok(Self {
            parent: parent.clone(),
            table: original.sibling(partition_name(&original.name, start, period)),
            start,
            end: advance(start, period, 1)?,
        })
    }

    /// 구조 생성 구문 (선언적: PARTITION OF, 트리거: CHECK + INHERITS)
    pub fn create_statement(&self, settings: &PartitionSettings) -> String {
        if settings.is_declarative() {
            format!(
                "CREATE TABLE {} PARTITION OF {} FOR VALUES FROM ({}) TO ({});",
                self.table.quoted(),
                self.parent.quoted(),
                sql_date(self.start, settings.cast, false),
                sql_date(self.end, settings.cast, false)
            )
        } else {
            let column = quote_ident(&settings.column);
            format!(
                "CREATE TABLE {}\n    (CHECK ({} >= {} AND {} < {}))\n    INHERITS ({});",
                self.table.quoted(),
                column,
                sql_date(self.start, settings.cast, true),
                column,
                sql_date(self.end, settings.cast, true),
                self.parent.quoted()
            )
        }
    }
}

/// 오늘 기준 [-past, +future] 범위의 후보 파티션 (past + future + 1 개)
pub fn candidate_partitions(
    original: &TableRef,
    parent: &TableRef,
    period: Period,
    today: NaiveDate,
    past: u32,
    future: u32,
) -> Result<Vec<PartitionDescriptor>> {
    (-i64::from(past)..=i64::from(future))
        .map(|offset| {
            let start = advance(today, period, offset)?;
            PartitionDescriptor::new(original, parent, start, period)
        })
        .collect()
}

/// add_partitions 옵션
#[derive(Debug, Clone)]
pub struct AddPartitionsOptions {
    pub table: TableRef,
    /// 중간 테이블에 추가
    pub intermediate: bool,
    pub past: u32,
    pub future: u32,
}

/// 누락된 파티션 생성 (트리거 방식이면 라우팅 함수도 재생성)
///
/// 이미 존재하는 파티션은 건너뛰므로 같은 범위로 다시 실행해도 안전합니다.
/// 새로 생성한 파티션 목록을 반환합니다.
pub async fn add_partitions<D>(
    session: &mut Session<D>,
    options: &AddPartitionsOptions,
    now: DateTime<Utc>,
) -> Result<Vec<PartitionDescriptor>>
where
    D: Catalog + StatementExecutor,
{
    let original = &options.table;
    let table = if options.intermediate {
        original.intermediate()
    } else {
        original.clone()
    };

    let db = session.db();

    if !db.table_exists(&table).await? {
        return Err(SliceError::TableNotFound(table.full_name()));
    }

    let settings = fetch_settings(db, original, &table)
        .await?
        .ok_or_else(|| SliceError::NoSettings {
            table: table.full_name(),
            hint: !options.intermediate,
        })?;

    let today = round_date(now, settings.period);
    let existing = db.partitions(&table).await?;

    let schema_source = if !settings.is_declarative() {
        table.clone()
    } else if options.intermediate {
        original.clone()
    } else {
        existing
            .last()
            .cloned()
            .ok_or_else(|| SliceError::NoPartitions(table.full_name()))?
    };

    // PG 11 이상은 선언적 파티션에 인덱스가 자동 전파됨
    let include_indexes =
        !settings.is_declarative() || db.server_version_num().await? < INDEX_PROPAGATION_MIN_VERSION;
    let template = SchemaTemplate::load(db, &schema_source, include_indexes).await?;
    debug!(
        "스키마 원본: {} (기본 키 {:?}, 인덱스 {}, 외래 키 {})",
        schema_source,
        template.primary_key,
        template.indexes.len(),
        template.foreign_keys.len()
    );

    let mut queries = Vec::new();
    let mut added = Vec::new();

    for partition in candidate_partitions(original, &table, settings.period, today, options.past, options.future)? {
        if db.table_exists(&partition.table).await? {
            debug!("파티션이 이미 존재함: {}", partition.table);
            continue;
        }

        queries.push(partition.create_statement(&settings));
        queries.extend(template.statements_for(&partition.table));
        added.push(partition);
    }

    if !settings.is_declarative() {
        let mut partitions = existing;
        partitions.extend(added.iter().map(|p| p.table.clone()));

        let rule = RoutingRule::compute(&partitions, &settings, today)?;
        if let Some(function) = rule.render(&original.trigger_function(), &settings) {
            queries.push(function);
        }
    }

    if queries.is_empty() {
        info!("추가할 파티션 없음: {}", table);
        return Ok(added);
    }

    session.run_queries(&queries).await?;
    info!("테이블 {} 에 대해 {} 개의 파티션 생성됨", table, added.len());

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryDatabase, MockTable};
    use chrono::TimeZone;

    const DAY_SETTINGS: &str = "column:createdAt,period:day,cast:date";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn options(intermediate: bool, past: u32, future: u32) -> AddPartitionsOptions {
        AddPartitionsOptions {
            table: TableRef::parse("posts"),
            intermediate,
            past,
            future,
        }
    }

    fn declarative_db() -> MemoryDatabase {
        MemoryDatabase::new()
            .with_table(
                MockTable::new("public.posts")
                    .columns(&["id", "createdAt"])
                    .primary_key(&["id"])
                    .index("CREATE INDEX posts_created_idx ON public.posts USING btree (\"createdAt\")")
                    .foreign_key("FOREIGN KEY (user_id) REFERENCES users(id)"),
            )
            .with_table(MockTable::new("public.posts_intermediate").comment(DAY_SETTINGS))
    }

    fn trigger_db() -> MemoryDatabase {
        MemoryDatabase::new().with_table(
            MockTable::new("public.posts_intermediate")
                .primary_key(&["id"])
                .index("CREATE INDEX i ON public.posts_intermediate USING btree (\"createdAt\")")
                .trigger_comment("posts_insert_trigger", DAY_SETTINGS),
        )
    }

    #[test]
    fn candidates_are_contiguous_and_count_past_plus_future_plus_one() {
        let original = TableRef::parse("posts");
        for period in [Period::Day, Period::Month, Period::Year] {
            for (past, future) in [(0, 0), (1, 1), (3, 0), (0, 5), (12, 12)] {
                let today = round_date(now(), period);
                let candidates =
                    candidate_partitions(&original, &original, period, today, past, future).unwrap();

                assert_eq!(candidates.len() as u32, past + future + 1);
                assert_eq!(candidates[past as usize].start, today);
                for pair in candidates.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                    assert!(pair[0].start < pair[0].end);
                }
            }
        }
    }

    #[tokio::test]
    async fn creates_yesterday_today_tomorrow() {
        let mut session = Session::new(declarative_db(), false);

        let added = add_partitions(&mut session, &options(true, 1, 1), now()).await.unwrap();

        let names: Vec<_> = added.iter().map(|p| p.table.name.as_str()).collect();
        assert_eq!(names, vec!["posts_20240309", "posts_20240310", "posts_20240311"]);
        assert_eq!((added[0].start, added[0].end), (ymd(2024, 3, 9), ymd(2024, 3, 10)));
        assert_eq!((added[2].start, added[2].end), (ymd(2024, 3, 11), ymd(2024, 3, 12)));

        let db = session.into_inner();
        assert_eq!(db.transactions.len(), 1);
        let statements = &db.transactions[0];
        assert_eq!(
            statements[0],
            "CREATE TABLE \"public\".\"posts_20240309\" PARTITION OF \"public\".\"posts_intermediate\" FOR VALUES FROM ('2024-03-09') TO ('2024-03-10');"
        );
        assert_eq!(statements[1], "ALTER TABLE \"public\".\"posts_20240309\" ADD PRIMARY KEY (\"id\");");
        // PG 16: 인덱스는 자동 전파되므로 외래 키만 추가
        assert!(statements[2].starts_with("ALTER TABLE \"public\".\"posts_20240309\" ADD FOREIGN KEY"));
        assert_eq!(statements.len(), 9);
    }

    #[tokio::test]
    async fn rerun_after_success_creates_nothing() {
        let mut session = Session::new(declarative_db(), false);

        add_partitions(&mut session, &options(true, 1, 1), now()).await.unwrap();
        let again = add_partitions(&mut session, &options(true, 1, 1), now()).await.unwrap();

        assert!(again.is_empty());
        assert_eq!(session.into_inner().transactions.len(), 1);
    }

    #[tokio::test]
    async fn only_missing_boundaries_are_created() {
        let db = declarative_db()
            .with_table(MockTable::new("public.posts_20240310").child_of("public.posts_intermediate"));
        let mut session = Session::new(db, false);

        let added = add_partitions(&mut session, &options(true, 1, 1), now()).await.unwrap();

        let names: Vec<_> = added.iter().map(|p| p.table.name.as_str()).collect();
        assert_eq!(names, vec!["posts_20240309", "posts_20240311"]);
    }

    #[tokio::test]
    async fn old_servers_copy_indexes_for_declarative() {
        let mut session = Session::new(declarative_db().with_version(100005), false);

        add_partitions(&mut session, &options(true, 0, 0), now()).await.unwrap();

        let statements = &session.db().transactions[0];
        assert!(statements.contains(
            &"CREATE INDEX ON \"public\".\"posts_20240310\" USING btree (\"createdAt\");".to_string()
        ));
    }

    #[tokio::test]
    async fn declarative_live_table_uses_latest_partition_as_schema() {
        let db = MemoryDatabase::new()
            .with_table(MockTable::new("public.posts").comment(DAY_SETTINGS))
            .with_table(MockTable::new("public.posts_20240301").child_of("public.posts"))
            .with_table(
                MockTable::new("public.posts_20240309")
                    .child_of("public.posts")
                    .primary_key(&["id", "createdAt"]),
            );
        let mut session = Session::new(db, false);

        add_partitions(&mut session, &options(false, 0, 1), now()).await.unwrap();

        let statements = &session.db().transactions[0];
        assert!(statements.contains(
            &"ALTER TABLE \"public\".\"posts_20240310\" ADD PRIMARY KEY (\"id\", \"createdAt\");".to_string()
        ));
    }

    #[tokio::test]
    async fn declarative_live_table_without_partitions_aborts() {
        let db = MemoryDatabase::new().with_table(MockTable::new("public.posts").comment(DAY_SETTINGS));
        let mut session = Session::new(db, false);

        let result = add_partitions(&mut session, &options(false, 0, 1), now()).await;
        assert!(matches!(result, Err(SliceError::NoPartitions(_))));
        assert!(session.db().transactions.is_empty());
    }

    #[tokio::test]
    async fn trigger_strategy_rebuilds_routing_function_from_all_partitions() {
        let db = trigger_db()
            .with_table(MockTable::new("public.posts_20240301").child_of("public.posts_intermediate"));
        let mut session = Session::new(db, false);

        let added = add_partitions(&mut session, &options(true, 0, 1), now()).await.unwrap();
        assert_eq!(added.len(), 2);

        let statements = &session.db().transactions[0];
        assert!(statements[0].contains("(CHECK (\"createdAt\" >= '2024-03-10'::date AND \"createdAt\" < '2024-03-11'::date))"));
        assert!(statements[0].ends_with("INHERITS (\"public\".\"posts_intermediate\");"));
        assert!(statements.iter().any(|s| s.starts_with("CREATE INDEX ON \"public\".\"posts_20240310\"")));

        let function = statements.last().unwrap();
        assert!(function.starts_with("CREATE OR REPLACE FUNCTION \"public\".\"posts_insert_trigger\"()"));
        let current = function.find("posts_20240310\"").unwrap();
        let future = function.find("posts_20240311\"").unwrap();
        let past = function.find("posts_20240301\"").unwrap();
        assert!(current < future && future < past);
    }

    #[tokio::test]
    async fn trigger_strategy_refreshes_function_even_without_new_partitions() {
        let db = trigger_db()
            .with_table(MockTable::new("public.posts_20240310").child_of("public.posts_intermediate"));
        let mut session = Session::new(db, false);

        let added = add_partitions(&mut session, &options(true, 0, 0), now()).await.unwrap();

        assert!(added.is_empty());
        let statements = &session.db().transactions[0];
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("CREATE OR REPLACE FUNCTION"));
    }

    #[tokio::test]
    async fn missing_settings_hint_at_intermediate() {
        let db = MemoryDatabase::new().with_table(MockTable::new("public.posts"));
        let mut session = Session::new(db, false);

        let err = add_partitions(&mut session, &options(false, 0, 0), now())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Did you mean to use --intermediate?"));
    }

    #[tokio::test]
    async fn missing_table_aborts_before_any_statement() {
        let mut session = Session::new(MemoryDatabase::new(), false);

        let result = add_partitions(&mut session, &options(true, 0, 0), now()).await;
        assert!(matches!(result, Err(SliceError::TableNotFound(name)) if name == "public.posts_intermediate"));
    }

    #[tokio::test]
    async fn dry_run_issues_nothing() {
        let mut session = Session::new(declarative_db(), true);

        let added = add_partitions(&mut session, &options(true, 1, 1), now()).await.unwrap();

        assert_eq!(added.len(), 3);
        assert!(session.db().transactions.is_empty());
    }
}
