use crate::db::catalog::Catalog;
use crate::db::quote::quote_columns;
use crate::error::{Result, SliceError};
use crate::table::TableRef;

/// 기본 키 이외 인덱스 정의
///
/// `pg_get_indexdef` 출력을 구조화하여 다른 테이블을 대상으로 다시 생성합니다.
/// 인덱스 이름은 서버가 새로 정하도록 생략합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub unique: bool,
    /// 접근 방식 (btree, gin, ...)
    pub method: String,
    /// 키 컬럼 목록과 그 뒤의 INCLUDE / WITH / WHERE 절
    pub body: String,
}

impl IndexDef {
    pub fn parse(def: &str) -> Result<Self> {
        let unsupported = || SliceError::UnsupportedDefinition(def.to_string());

        let (unique, rest) = if let Some(rest) = def.strip_prefix("CREATE UNIQUE INDEX ") {
            (true, rest)
        } else if let Some(rest) = def.strip_prefix("CREATE INDEX ") {
            (false, rest)
        } else {
            return Err(unsupported());
        };

        let (_, target) = rest.split_once(" ON ").ok_or_else(unsupported)?;
        let (_, using) = target.split_once(" USING ").ok_or_else(unsupported)?;
        let (method, body) = using.split_once(' ').ok_or_else(unsupported)?;

        if method.is_empty() || !body.starts_with('(') {
            return Err(unsupported());
        }

        Ok(Self {
            unique,
            method: method.to_string(),
            body: body.trim_end().to_string(),
        })
    }

    pub fn render(&self, target: &TableRef) -> String {
        format!(
            "CREATE {}INDEX ON {} USING {} {};",
            if self.unique { "UNIQUE " } else { "" },
            target.quoted(),
            self.method,
            self.body
        )
    }
}

/// 외래 키 정의 (`pg_get_constraintdef` 출력 구조화)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    /// 서버가 인용한 그대로의 컬럼 표기
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    /// ON DELETE / ON UPDATE / MATCH / DEFERRABLE 등 나머지 절
    pub options: String,
}

impl ForeignKeyDef {
    pub fn parse(def: &str) -> Result<Self> {
        let unsupported = || SliceError::UnsupportedDefinition(def.to_string());

        let rest = def.strip_prefix("FOREIGN KEY (").ok_or_else(unsupported)?;
        let (columns, rest) = rest.split_once(") REFERENCES ").ok_or_else(unsupported)?;
        let (referenced_table, rest) = rest.split_once('(').ok_or_else(unsupported)?;
        let (referenced_columns, options) = rest.split_once(')').ok_or_else(unsupported)?;

        let split = |list: &str| -> Vec<String> {
            list.split(", ").map(|c| c.trim().to_string()).collect()
        };

        if columns.is_empty() || referenced_table.is_empty() || referenced_columns.is_empty() {
            return Err(unsupported());
        }

        Ok(Self {
            columns: split(columns),
            referenced_table: referenced_table.trim().to_string(),
            referenced_columns: split(referenced_columns),
            options: options.trim().to_string(),
        })
    }

    pub fn render(&self, target: &TableRef) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {}({})",
            target.quoted(),
            self.columns.join(", "),
            self.referenced_table,
            self.referenced_columns.join(", ")
        );
        if !self.options.is_empty() {
            sql.push(' ');
            sql.push_str(&self.options);
        }
        sql.push(';');
        sql
    }
}

/// 새 파티션에 전파할 스키마 (기본 키, 인덱스, 외래 키)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTemplate {
    pub primary_key: Vec<String>,
    pub indexes: Vec<IndexDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl SchemaTemplate {
    /// 스키마 원본 테이블에서 로드 (인덱스는 필요할 때만)
    pub async fn load<C: Catalog + ?Sized>(
        catalog: &C,
        source: &TableRef,
        include_indexes: bool,
    ) -> Result<Self> {
        let indexes = if include_indexes {
            catalog.index_defs(source).await?
        } else {
            Vec::new()
        };

        Ok(Self {
            primary_key: catalog.primary_key(source).await?,
            indexes,
            foreign_keys: catalog.foreign_keys(source).await?,
        })
    }

    /// 대상 테이블용 기본 키, 인덱스, 외래 키 생성 구문
    pub fn statements_for(&self, target: &TableRef) -> Vec<String> {
        let mut statements = Vec::new();

        if !self.primary_key.is_empty() {
            statements.push(format!(
                "ALTER TABLE {} ADD PRIMARY KEY ({});",
                target.quoted(),
                quote_columns(&self.primary_key)
            ));
        }

        statements.extend(self.indexes.iter().map(|index| index.render(target)));
        statements.extend(self.foreign_keys.iter().map(|fk| fk.render(target)));
        statements
    }
}
