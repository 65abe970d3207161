// 데이터베이스 관리 모듈
// 연결 설정 로드, 연결 생성, 카탈로그 조회 및 구문 실행을 담당합니다.

pub mod catalog;
pub mod config;
pub mod executor;
pub mod pool;
pub mod postgres;
pub mod quote;

// 외부로 노출할 항목들
pub use catalog::{Catalog, TimeBound};
pub use config::DbConfig;
pub use executor::{Session, StatementExecutor};
pub use pool::connect;
pub use postgres::PgDatabase;
