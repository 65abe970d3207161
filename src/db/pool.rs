use std::time::Duration;

use deadpool_postgres::{Config, PoolConfig, Runtime};
use log::{debug, info};
use tokio_postgres::NoTls;

use super::config::DbConfig;
use super::postgres::PgDatabase;
use crate::error::Result;

/// 호출당 하나의 연결 생성
///
/// 풀 크기를 1로 고정하여 모든 작업이 같은 연결에서 순차 실행됩니다.
pub async fn connect(db_config: &DbConfig) -> Result<PgDatabase> {
    let mut cfg = Config::new();

    match &db_config.url {
        Some(url) => {
            cfg.url = Some(url.clone());
        }
        None => {
            let conn = &db_config.connection;
            cfg.host = Some(conn.host.clone());
            cfg.port = Some(conn.port);
            cfg.user = Some(conn.user.clone());
            cfg.password = Some(conn.password.clone());
            cfg.dbname = Some(conn.database.clone());
        }
    }

    cfg.connect_timeout = Some(Duration::from_secs(db_config.connection.connection_timeout_seconds));
    cfg.pool = Some(PoolConfig::new(1));

    debug!("DB 연결 생성 중: {}", db_config.describe());
    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;

    // 연결 테스트
    let client = pool.get().await?;
    let row = client.query_one("SELECT version()", &[]).await?;
    let version: String = row.get(0);
    info!("DB 연결 성공: {}", version);

    Ok(PgDatabase::new(pool, client))
}
