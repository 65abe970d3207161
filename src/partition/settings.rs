use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::constants::SETTINGS_COMMENT_PREFIX;
use crate::db::catalog::Catalog;
use crate::error::{Result, SliceError};
use crate::partition::period::Period;
use crate::table::TableRef;

/// 파티션 컬럼의 SQL 캐스트
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    Date,
    Timestamptz,
}

impl Cast {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cast::Date => "date",
            Cast::Timestamptz => "timestamptz",
        }
    }

    /// information_schema 데이터 타입으로부터 캐스트 결정
    pub fn from_data_type(data_type: &str) -> Self {
        if data_type == "timestamp with time zone" {
            Cast::Timestamptz
        } else {
            Cast::Date
        }
    }
}

impl fmt::Display for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cast {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "date" => Ok(Cast::Date),
            "timestamptz" => Ok(Cast::Timestamptz),
            other => Err(SliceError::InvalidCast(other.to_string())),
        }
    }
}

/// 파티셔닝 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// 네이티브 범위 파티션
    Declarative,
    /// 상속 + 삽입 라우팅 트리거
    Trigger,
}

/// 파티셔닝 설정 - prep 시 한 번 기록되고 이후 읽기 전용
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSettings {
    pub column: String,
    pub period: Period,
    pub cast: Cast,
    pub strategy: Strategy,
}

impl PartitionSettings {
    pub fn is_declarative(&self) -> bool {
        self.strategy == Strategy::Declarative
    }

    /// 주석 문자열로 직렬화 (column:x,period:day,cast:date)
    pub fn encode(&self) -> String {
        format!("column:{},period:{},cast:{}", self.column, self.period, self.cast)
    }

    /// 주석 문자열 해석
    ///
    /// 설정 키로 시작하지 않는 주석은 설정 없음(`None`), 키로 시작하지만
    /// 해석할 수 없는 주석은 `MalformedSettings` 오류입니다.
    pub fn decode(table: &TableRef, comment: &str, strategy: Strategy) -> Result<Option<Self>> {
        if !comment.starts_with(SETTINGS_COMMENT_PREFIX) {
            return Ok(None);
        }

        let malformed = || SliceError::MalformedSettings {
            table: table.full_name(),
            comment: comment.to_string(),
        };

        let mut column = None;
        let mut period = None;
        let mut cast = None;

        for part in comment.split(',') {
            let (key, value) = part.split_once(':').ok_or_else(malformed)?;
            match key {
                "column" if column.is_none() && !value.is_empty() => column = Some(value.to_string()),
                "period" if period.is_none() => period = Some(value.parse::<Period>().map_err(|_| malformed())?),
                "cast" if cast.is_none() => cast = Some(value.parse::<Cast>().map_err(|_| malformed())?),
                _ => return Err(malformed()),
            }
        }

        match (column, period, cast) {
            (Some(column), Some(period), Some(cast)) => Ok(Some(Self {
                column,
                period,
                cast,
                strategy,
            })),
            _ => Err(malformed()),
        }
    }
}

/// 테이블 또는 트리거 주석에서 파티셔닝 설정 조회
///
/// 트리거 주석이 있으면 트리거 방식, 테이블 주석만 있으면 선언적 방식입니다.
pub async fn fetch_settings<C: Catalog + ?Sized>(
    catalog: &C,
    original: &TableRef,
    table: &TableRef,
) -> Result<Option<PartitionSettings>> {
    let trigger_comment = catalog
        .trigger_comment(table, &original.trigger_name())
        .await?
        .filter(|c| !c.is_empty());

    let settings = match trigger_comment {
        Some(comment) => PartitionSettings::decode(table, &comment, Strategy::Trigger)?,
        None => match catalog.table_comment(table).await? {
            Some(comment) => PartitionSettings::decode(table, &comment, Strategy::Declarative)?,
            None => None,
        },
    };

    debug!("파티셔닝 설정 조회: {} -> {:?}", table, settings);
    Ok(settings)
}
