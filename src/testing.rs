// 테스트용 메모리 DB - 카탈로그 상태를 흉내내고 실행된 구문을 기록

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::catalog::{Catalog, TimeBound};
use crate::db::executor::StatementExecutor;
use crate::error::{Result, SliceError};
use crate::partition::schema::{ForeignKeyDef, IndexDef};
use crate::partition::settings::Cast;
use crate::table::{Sequence, TableRef};

#[derive(Debug, Clone)]
pub struct MockTable {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub column_types: HashMap<String, String>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<IndexDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
    pub sequences: Vec<Sequence>,
    pub comment: Option<String>,
    pub trigger_comments: HashMap<String, String>,
    pub ids: Vec<i64>,
    /// 시간 컬럼 값 (TimeBound 판정용)
    pub dates: HashMap<i64, NaiveDate>,
    /// WHERE 조건 문자열별 일치 ID
    pub filters: HashMap<String, Vec<i64>>,
    pub parent: Option<TableRef>,
}

impl MockTable {
    pub fn new(full_name: &str) -> Self {
        Self {
            table: TableRef::parse(full_name),
            columns: Vec::new(),
            column_types: HashMap::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            sequences: Vec::new(),
            comment: None,
            trigger_comments: HashMap::new(),
            ids: Vec::new(),
            dates: HashMap::new(),
            filters: HashMap::new(),
            parent: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn column_type(mut self, column: &str, data_type: &str) -> Self {
        self.column_types.insert(column.to_string(), data_type.to_string());
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn index(mut self, def: &str) -> Self {
        self.indexes.push(IndexDef::parse(def).unwrap());
        self
    }

    pub fn foreign_key(mut self, def: &str) -> Self {
        self.foreign_keys.push(ForeignKeyDef::parse(def).unwrap());
        self
    }

    pub fn sequence(mut self, name: &str, column: &str) -> Self {
        self.sequences.push(Sequence {
            schema: self.table.schema.clone(),
            name: name.to_string(),
            column: column.to_string(),
        });
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn trigger_comment(mut self, trigger: &str, comment: &str) -> Self {
        self.trigger_comments.insert(trigger.to_string(), comment.to_string());
        self
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }

    pub fn dated(mut self, ids: impl IntoIterator<Item = i64>, date: NaiveDate) -> Self {
        self.dates.extend(ids.into_iter().map(|id| (id, date)));
        self
    }

    pub fn matching(mut self, filter: &str, ids: impl IntoIterator<Item = i64>) -> Self {
        self.filters.insert(filter.to_string(), ids.into_iter().collect());
        self
    }

    /// filter 와 since 를 만족하는 ID
    fn qualifying<'a>(
        &'a self,
        since: Option<&'a TimeBound>,
        filter: Option<&'a str>,
    ) -> impl Iterator<Item = i64> + 'a {
        // 호출 측은 조건을 괄호로 감싸서 전달함
        let matched = filter.map(|f| {
            let key = f.strip_prefix('(').and_then(|f| f.strip_suffix(')')).unwrap_or(f);
            self.filters.get(key).cloned().unwrap_or_default()
        });

        self.ids.iter().copied().filter(move |id| {
            let in_filter = matched.as_ref().map_or(true, |ids| ids.contains(id));
            let in_window = since.map_or(true, |bound| {
                self.dates.get(id).is_some_and(|date| *date >= bound.since)
            });
            in_filter && in_window
        })
    }

    pub fn child_of(mut self, parent: &str) -> Self {
        self.parent = Some(TableRef::parse(parent));
        self
    }
}

/// 메모리 DB
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    pub tables: BTreeMap<String, MockTable>,
    pub version: i32,
    /// 자동 커밋으로 실행된 구문
    pub executed: Vec<String>,
    /// 커밋된 트랜잭션 묶음
    pub transactions: Vec<Vec<String>>,
    /// 이 문자열을 포함하는 구문은 실패
    pub fail_on: Option<String>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self {
            version: 160000,
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn with_table(mut self, table: MockTable) -> Self {
        self.tables.insert(table.table.full_name(), table);
        self
    }

    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn table(&self, full_name: &str) -> &MockTable {
        &self.tables[full_name]
    }

    fn get(&self, table: &TableRef) -> Option<&MockTable> {
        self.tables.get(&table.full_name())
    }

    fn find_quoted(&self, quoted: &str) -> Option<String> {
        self.tables
            .values()
            .find(|t| t.table.quoted() == quoted)
            .map(|t| t.table.full_name())
    }

    fn check_failure(&self, statement: &str) -> Result<()> {
        match &self.fail_on {
            Some(needle) if statement.contains(needle.as_str()) => Err(SliceError::Io(
                std::io::Error::new(std::io::ErrorKind::Other, "simulated failure"),
            )),
            _ => Ok(()),
        }
    }

    /// CREATE TABLE ... PARTITION OF / INHERITS 구문을 테이블로 반영
    fn apply_ddl(&mut self, statement: &str) {
        let Some(rest) = statement.strip_prefix("CREATE TABLE ") else {
            return;
        };
        let name = rest.split_whitespace().next().unwrap_or_default();
        let parent = if let Some((_, tail)) = rest.split_once(" PARTITION OF ") {
            tail.split_whitespace().next()
        } else if let Some((_, tail)) = rest.split_once("INHERITS (") {
            tail.split(')').next()
        } else {
            None
        };

        if let (Some(table), Some(parent)) = (unquote(name), parent.and_then(unquote)) {
            let mut mock = MockTable::new(&table.full_name());
            mock.parent = Some(parent);
            self.tables.insert(table.full_name(), mock);
        }
    }

    /// INSERT ... SELECT 배치를 흉내: 원본 ID 중 범위 내 ID를 대상으로 복사
    fn apply_insert(&mut self, statement: &str) -> u64 {
        let dest = between(statement, "INSERT INTO ", " (").and_then(|q| self.find_quoted(q));
        let source = between(statement, " FROM ", "\n").and_then(|q| self.find_quoted(q));
        let low = number_after(statement, " > ");
        let high = number_after(statement, " <= ");

        let (Some(dest), Some(source), Some(low), Some(high)) = (dest, source, low, high) else {
            return 0;
        };

        let existing = self.tables[&dest].ids.clone();
        let copied: Vec<i64> = self.tables[&source]
            .ids
            .iter()
            .copied()
            .filter(|id| *id > low && *id <= high && !existing.contains(id))
            .collect();

        let count = copied.len() as u64;
        if let Some(table) = self.tables.get_mut(&dest) {
            table.ids.extend(copied);
        }
        count
    }
}

fn unquote(quoted: &str) -> Option<TableRef> {
    let (schema, name) = quoted.split_once("\".\"")?;
    Some(TableRef::new(schema.trim_start_matches('"'), name.trim_end_matches('"')))
}

fn between<'a>(s: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let (_, rest) = s.split_once(start)?;
    rest.split_once(end).map(|(inner, _)| inner)
}

fn number_after(s: &str, marker: &str) -> Option<i64> {
    let (_, rest) = s.split_once(marker)?;
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse().ok()
}

#[async_trait]
impl Catalog for MemoryDatabase {
    async fn table_exists(&self, table: &TableRef) -> Result<bool> {
        Ok(self.get(table).is_some())
    }

    async fn columns(&self, table: &TableRef) -> Result<Vec<String>> {
        Ok(self.get(table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    async fn column_cast(&self, table: &TableRef, column: &str) -> Result<Cast> {
        self.get(table)
            .and_then(|t| t.column_types.get(column))
            .map(|data_type| Cast::from_data_type(data_type))
            .ok_or_else(|| SliceError::ColumnNotFound(column.to_string()))
    }

    async fn primary_key(&self, table: &TableRef) -> Result<Vec<String>> {
        Ok(self.get(table).map(|t| t.primary_key.clone()).unwrap_or_default())
    }

    async fn foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKeyDef>> {
        Ok(self.get(table).map(|t| t.foreign_keys.clone()).unwrap_or_default())
    }

    async fn index_defs(&self, table: &TableRef) -> Result<Vec<IndexDef>> {
        Ok(self.get(table).map(|t| t.indexes.clone()).unwrap_or_default())
    }

    async fn sequences(&self, table: &TableRef) -> Result<Vec<Sequence>> {
        Ok(self.get(table).map(|t| t.sequences.clone()).unwrap_or_default())
    }

    async fn partitions(&self, table: &TableRef) -> Result<Vec<TableRef>> {
        Ok(self
            .tables
            .values()
            .filter(|t| t.parent.as_ref() == Some(table))
            .map(|t| t.table.clone())
            .collect())
    }

    async fn table_comment(&self, table: &TableRef) -> Result<Option<String>> {
        Ok(self.get(table).and_then(|t| t.comment.clone()))
    }

    async fn trigger_comment(&self, table: &TableRef, trigger_name: &str) -> Result<Option<String>> {
        Ok(self
            .get(table)
            .and_then(|t| t.trigger_comments.get(trigger_name).cloned()))
    }

    async fn server_version_num(&self) -> Result<i32> {
        Ok(self.version)
    }

    async fn max_id(
        &self,
        table: &TableRef,
        _primary_key: &str,
        below: Option<i64>,
        filter: Option<&str>,
    ) -> Result<Option<i64>> {
        Ok(self.get(table).and_then(|t| {
            t.qualifying(None, filter)
                .filter(|id| below.map_or(true, |b| *id <= b))
                .max()
        }))
    }

    async fn min_id(
        &self,
        table: &TableRef,
        _primary_key: &str,
        since: Option<&TimeBound>,
        filter: Option<&str>,
    ) -> Result<Option<i64>> {
        Ok(self.get(table).and_then(|t| t.qualifying(since, filter).min()))
    }
}

#[async_trait]
impl StatementExecutor for MemoryDatabase {
    async fn execute(&mut self, statement: &str) -> Result<u64> {
        self.check_failure(statement)?;
        self.executed.push(statement.to_string());
        Ok(self.apply_insert(statement))
    }

    async fn execute_transaction(&mut self, statements: &[String]) -> Result<()> {
        for statement in statements {
            self.check_failure(statement)?;
        }
        for statement in statements {
            self.apply_ddl(statement);
        }
        self.transactions.push(statements.to_vec());
        Ok(())
    }
}
