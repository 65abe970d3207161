use async_trait::async_trait;
use log::{debug, trace};

use crate::error::Result;

/// SQL 구문 실행 인터페이스
#[async_trait]
pub trait StatementExecutor: Send {
    /// 단일 구문 실행 (자동 커밋), 영향받은 행 수 반환
    async fn execute(&mut self, statement: &str) -> Result<u64>;

    /// 여러 구문을 하나의 트랜잭션으로 실행 - 모두 적용되거나 모두 취소
    async fn execute_transaction(&mut self, statements: &[String]) -> Result<()>;
}

/// 실행 컨텍스트 - DB 핸들과 dry-run 여부
///
/// 모든 구문은 표준 출력에 기록되며, dry-run 에서는 실행하지 않습니다.
pub struct Session<D> {
    db: D,
    dry_run: bool,
}

impl<D> Session<D> {
    pub fn new(db: D, dry_run: bool) -> Self {
        Self { db, dry_run }
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn into_inner(self) -> D {
        self.db
    }
}

impl<D: StatementExecutor> Session<D> {
    /// 트랜잭션으로 묶어 실행
    pub async fn run_queries(&mut self, statements: &[String]) -> Result<()> {
        log_sql("BEGIN;");
        for statement in statements {
            log_sql(statement);
        }
        log_sql("COMMIT;");

        if self.dry_run {
            debug!("dry-run: {} 개 구문 실행 생략", statements.len());
            return Ok(());
        }

        self.db.execute_transaction(statements).await
    }

    /// 트랜잭션 없이 하나씩 실행
    pub async fn run_queries_without_transaction(&mut self, statements: &[String]) -> Result<()> {
        for statement in statements {
            self.run_query(statement).await?;
        }
        Ok(())
    }

    /// 단일 구문 실행, dry-run 이면 0 반환
    pub async fn run_query(&mut self, statement: &str) -> Result<u64> {
        log_sql(statement);

        if self.dry_run {
            return Ok(0);
        }

        let rows = self.db.execute(statement).await?;
        trace!("구문 실행 완료: {} 행", rows);
        Ok(rows)
    }
}

/// 구문 출력 - 도구의 주 출력이므로 표준 출력 사용
pub fn log_sql(statement: &str) {
    println!("{}\n", statement);
}
