use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::partition::schema::{ForeignKeyDef, IndexDef};
use crate::partition::settings::Cast;
use crate::table::{Sequence, TableRef};

/// 최소 ID 조회 시 적용할 시간 하한 (column >= date::cast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBound {
    pub column: String,
    pub since: NaiveDate,
    pub cast: Cast,
}

/// 카탈로그 조회 인터페이스 (읽기 전용)
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn table_exists(&self, table: &TableRef) -> Result<bool>;

    /// 정의 순서의 컬럼 이름
    async fn columns(&self, table: &TableRef) -> Result<Vec<String>>;

    async fn column_cast(&self, table: &TableRef, column: &str) -> Result<Cast>;

    /// 키 순서의 기본 키 컬럼 (없으면 빈 목록)
    async fn primary_key(&self, table: &TableRef) -> Result<Vec<String>>;

    async fn foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKeyDef>>;

    /// 기본 키 이외 인덱스
    async fn index_defs(&self, table: &TableRef) -> Result<Vec<IndexDef>>;

    async fn sequences(&self, table: &TableRef) -> Result<Vec<Sequence>>;

    /// 상속 자식 테이블 (이름순)
    async fn partitions(&self, table: &TableRef) -> Result<Vec<TableRef>>;

    /// 테이블 주석 (없으면 None)
    async fn table_comment(&self, table: &TableRef) -> Result<Option<String>>;

    /// 테이블에 걸린 트리거의 주석 (트리거 또는 주석이 없으면 None)
    async fn trigger_comment(&self, table: &TableRef, trigger_name: &str) -> Result<Option<String>>;

    async fn server_version_num(&self) -> Result<i32>;

    /// 조건에 맞는 최대 기본 키 (행이 없으면 None)
    async fn max_id(
        &self,
        table: &TableRef,
        primary_key: &str,
        below: Option<i64>,
        filter: Option<&str>,
    ) -> Result<Option<i64>>;

    /// 조건에 맞는 최소 기본 키 (행이 없으면 None)
    async fn min_id(
        &self,
        table: &TableRef,
        primary_key: &str,
        since: Option<&TimeBound>,
        filter: Option<&str>,
    ) -> Result<Option<i64>>;
}
