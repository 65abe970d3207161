use chrono::NaiveDate;

use crate::constants::ROUTING_OUT_OF_RANGE_MESSAGE;
use crate::db::quote::quote_ident;
use crate::error::Result;
use crate::partition::period::{advance, partition_date, sql_date};
use crate::partition::settings::PartitionSettings;
use crate::table::TableRef;

/// 오늘 기준 파티션 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Current,
    Future,
    Past,
}

/// 라우팅 분기 하나 - 파티션과 [start, end) 구간
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingBranch {
    pub partition: TableRef,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub placement: Placement,
}

/// 트리거 방식의 삽입 라우팅 규칙
///
/// 매번 전체 파티션 집합에서 다시 계산하며, 분기 순서는 현재, 미래(오름차순),
/// 과거(오름차순) 입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    pub branches: Vec<RoutingBranch>,
}

impl RoutingRule {
    pub fn compute(
        partitions: &[TableRef],
        settings: &PartitionSettings,
        today: NaiveDate,
    ) -> Result<Self> {
        let mut sorted = partitions.to_vec();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted.dedup();

        let mut current = Vec::new();
        let mut future = Vec::new();
        let mut past = Vec::new();

        for partition in sorted {
            let start = partition_date(&partition.name, settings.period)?;
            let end = advance(start, settings.period, 1)?;

            let placement = if start == today {
                Placement::Current
            } else if end <= today {
                Placement::Past
            } else {
                Placement::Future
            };

            let branch = RoutingBranch {
                partition,
                start,
                end,
                placement,
            };

            match placement {
                Placement::Current => current.push(branch),
                Placement::Future => future.push(branch),
                Placement::Past => past.push(branch),
            }
        }

        // 과거 분기도 이름 오름차순
        current.extend(future);
        current.extend(past);

        Ok(Self { branches: current })
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// 라우팅 함수 생성 구문 (분기가 없으면 None)
    pub fn render(&self, function: &str, settings: &PartitionSettings) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let column = quote_ident(&settings.column);
        let branches: Vec<String> = self
            .branches
            .iter()
            .map(|branch| {
                format!(
                    "(NEW.{col} >= {start} AND NEW.{col} < {end}) THEN\n            INSERT INTO {table} VALUES (NEW.*);",
                    col = column,
                    start = sql_date(branch.start, settings.cast, true),
                    end = sql_date(branch.end, settings.cast, true),
                    table = branch.partition.quoted(),
                )
            })
            .collect();

        Some(format!(
            "CREATE OR REPLACE FUNCTION {}()
    RETURNS trigger AS $$
    BEGIN
        IF {}
        ELSE
            RAISE EXCEPTION '{}';
        END IF;
        RETURN NULL;
    END;
    $$ LANGUAGE plpgsql;",
            function,
            branches.join("\n        ELSIF "),
            ROUTING_OUT_OF_RANGE_MESSAGE
        ))
    }
}
