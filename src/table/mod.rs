use std::fmt;

use crate::constants::{
    DEFAULT_SCHEMA, INTERMEDIATE_SUFFIX, RETIRED_SUFFIX, TRIGGER_SUFFIX,
};
use crate::db::quote::quote_ident;

/// 테이블 참조 (스키마 + 이름)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// "schema.name" 또는 "name" 형식 파싱 (스키마 생략 시 public)
    pub fn parse(input: &str) -> Self {
        match input.split_once('.') {
            Some((schema, name)) => Self::new(schema, name),
            None => Self::new(DEFAULT_SCHEMA, input),
        }
    }

    /// 파티션 준비용 중간 테이블
    pub fn intermediate(&self) -> Self {
        Self::new(&self.schema, format!("{}{}", self.name, INTERMEDIATE_SUFFIX))
    }

    /// 스왑 후 보관되는 이전 테이블
    pub fn retired(&self) -> Self {
        Self::new(&self.schema, format!("{}{}", self.name, RETIRED_SUFFIX))
    }

    /// 같은 스키마의 다른 이름 테이블
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(&self.schema, name)
    }

    /// 삽입 라우팅 트리거 이름 (함수 이름과 동일)
    pub fn trigger_name(&self) -> String {
        format!("{}{}", self.name, TRIGGER_SUFFIX)
    }

    /// 스키마로 한정된 라우팅 함수 이름 (인용됨)
    pub fn trigger_function(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.trigger_name()))
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// 스키마 포함 인용 이름
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }

    /// 스키마 없는 인용 이름 (RENAME TO 대상)
    pub fn quoted_name(&self) -> String {
        quote_ident(&self.name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// 테이블이 소유한 시퀀스
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub schema: String,
    pub name: String,
    pub column: String,
}

impl Sequence {
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}
