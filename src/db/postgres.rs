use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use log::{debug, trace};

use crate::constants::catalog;
use crate::db::catalog::{Catalog, TimeBound};
use crate::db::executor::StatementExecutor;
use crate::db::quote::quote_ident;
use crate::error::{Result, SliceError};
use crate::partition::period::sql_date;
use crate::partition::schema::{ForeignKeyDef, IndexDef};
use crate::partition::settings::Cast;
use crate::table::{Sequence, TableRef};

/// PostgreSQL 연결 - 카탈로그 조회와 구문 실행을 모두 담당
pub struct PgDatabase {
    client: Object,
    // 연결이 살아 있는 동안 풀 유지
    _pool: Pool,
}

impl PgDatabase {
    pub fn new(pool: Pool, client: Object) -> Self {
        Self { client, _pool: pool }
    }

    /// 단일 값 집계 쿼리 (MIN/MAX) 실행
    async fn aggregate_id(&self, query: String) -> Result<Option<i64>> {
        trace!("ID 조회: {}", query);
        let row = self.client.query_one(query.as_str(), &[]).await?;
        Ok(row.get::<_, Option<i64>>(0))
    }
}

/// WHERE 절 결합
fn with_conditions(mut query: String, conditions: &[String]) -> String {
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }
    query
}

/// 최대 ID 조회 쿼리 (below 이하, filter 일치)
fn max_id_query(table: &TableRef, primary_key: &str, below: Option<i64>, filter: Option<&str>) -> String {
    let pk = quote_ident(primary_key);
    let mut conditions = Vec::new();
    if let Some(below) = below {
        conditions.push(format!("{} <= {}", pk, below));
    }
    if let Some(filter) = filter {
        conditions.push(filter.to_string());
    }

    let query = format!("SELECT MAX({})::bigint FROM {}", pk, table.quoted());
    with_conditions(query, &conditions)
}

/// 최소 ID 조회 쿼리 (since 이후, filter 일치)
fn min_id_query(
    table: &TableRef,
    primary_key: &str,
    since: Option<&TimeBound>,
    filter: Option<&str>,
) -> String {
    let pk = quote_ident(primary_key);
    let mut conditions = Vec::new();
    if let Some(bound) = since {
        conditions.push(format!(
            "{} >= {}",
            quote_ident(&bound.column),
            sql_date(bound.since, bound.cast, true)
        ));
    }
    if let Some(filter) = filter {
        conditions.push(filter.to_string());
    }

    let query = format!("SELECT MIN({})::bigint FROM {}", pk, table.quoted());
    with_conditions(query, &conditions)
}

#[async_trait]
impl Catalog for PgDatabase {
    async fn table_exists(&self, table: &TableRef) -> Result<bool> {
        let row = self
            .client
            .query_one(catalog::TABLE_EXISTS, &[&table.schema, &table.name])
            .await?;
        Ok(row.get(0))
    }

    async fn columns(&self, table: &TableRef) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(catalog::COLUMNS, &[&table.schema, &table.name])
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn column_cast(&self, table: &TableRef, column: &str) -> Result<Cast> {
        let row = self
            .client
            .query_opt(catalog::COLUMN_TYPE, &[&table.schema, &table.name, &column])
            .await?
            .ok_or_else(|| SliceError::ColumnNotFound(column.to_string()))?;
        Ok(Cast::from_data_type(row.get::<_, &str>(0)))
    }

    async fn primary_key(&self, table: &TableRef) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(catalog::PRIMARY_KEY, &[&table.schema, &table.name])
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKeyDef>> {
        let rows = self
            .client
            .query(catalog::FOREIGN_KEYS, &[&table.quoted()])
            .await?;
        rows.iter()
            .map(|row| ForeignKeyDef::parse(row.get::<_, &str>(0)))
            .collect()
    }

    async fn index_defs(&self, table: &TableRef) -> Result<Vec<IndexDef>> {
        let rows = self
            .client
            .query(catalog::INDEX_DEFS, &[&table.quoted()])
            .await?;
        rows.iter()
            .map(|row| IndexDef::parse(row.get::<_, &str>(0)))
            .collect()
    }

    async fn sequences(&self, table: &TableRef) -> Result<Vec<Sequence>> {
        let rows = self
            .client
            .query(catalog::SEQUENCES, &[&table.schema, &table.name])
            .await?;
        Ok(rows
            .iter()
            .map(|row| Sequence {
                schema: row.get(0),
                name: row.get(1),
                column: row.get(2),
            })
            .collect())
    }

    async fn partitions(&self, table: &TableRef) -> Result<Vec<TableRef>> {
        let rows = self
            .client
            .query(catalog::PARTITIONS, &[&table.schema, &table.name])
            .await?;
        Ok(rows
            .iter()
            .map(|row| TableRef::new(row.get::<_, String>(0), row.get::<_, String>(1)))
            .collect())
    }

    async fn table_comment(&self, table: &TableRef) -> Result<Option<String>> {
        let row = self
            .client
            .query_one(catalog::TABLE_COMMENT, &[&table.quoted()])
            .await?;
        let comment: String = row.get(0);
        Ok(Some(comment).filter(|c| !c.is_empty()))
    }

    async fn trigger_comment(&self, table: &TableRef, trigger_name: &str) -> Result<Option<String>> {
        let row = self
            .client
            .query_opt(catalog::TRIGGER_COMMENT, &[&trigger_name, &table.quoted()])
            .await?;
        Ok(row
            .map(|row| row.get::<_, String>(0))
            .filter(|c| !c.is_empty()))
    }

    async fn server_version_num(&self) -> Result<i32> {
        let row = self.client.query_one(catalog::SERVER_VERSION_NUM, &[]).await?;
        let version: i32 = row.get(0);
        debug!("서버 버전: {}", version);
        Ok(version)
    }

    async fn max_id(
        &self,
        table: &TableRef,
        primary_key: &str,
        below: Option<i64>,
        filter: Option<&str>,
    ) -> Result<Option<i64>> {
        self.aggregate_id(max_id_query(table, primary_key, below, filter)).await
    }

    async fn min_id(
        &self,
        table: &TableRef,
        primary_key: &str,
        since: Option<&TimeBound>,
        filter: Option<&str>,
    ) -> Result<Option<i64>> {
        self.aggregate_id(min_id_query(table, primary_key, since, filter)).await
    }
}

#[async_trait]
impl StatementExecutor for PgDatabase {
    async fn execute(&mut self, statement: &str) -> Result<u64> {
        Ok(self.client.execute(statement, &[]).await?)
    }

    async fn execute_transaction(&mut self, statements: &[String]) -> Result<()> {
        let transaction = self.client.transaction().await?;
        for statement in statements {
            // 함수 본문($$) 등 유틸리티 구문은 단순 프로토콜로 실행
            transaction.batch_execute(statement).await?;
        }
        transaction.commit().await?;
        debug!("트랜잭션 커밋: {} 개 구문", statements.len());
        Ok(())
    }
}
