use thiserror::Error;

/// pgslice 전역 Result 타입
pub type Result<T> = std::result::Result<T, SliceError>;

/// pgslice 오류 정의
#[derive(Debug, Error)]
pub enum SliceError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid cast: {0}")]
    InvalidCast(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("No settings found: {table}{}", if *.hint { "\nDid you mean to use --intermediate?" } else { "" })]
    NoSettings { table: String, hint: bool },

    #[error("Malformed settings on {table}: {comment}")]
    MalformedSettings { table: String, comment: String },

    #[error("No partitions: {0}")]
    NoPartitions(String),

    #[error("No primary key: {0}")]
    NoPrimaryKey(String),

    #[error("Invalid partition name: {0}")]
    PartitionName(String),

    #[error("Unsupported definition: {0}")]
    UnsupportedDefinition(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// 배치 실패 - 재개 지점(start)을 함께 보고
    #[error("Batch {batch} of {total} failed (ids > {start} and <= {end}); resume with --start {start}: {source}")]
    BatchFailed {
        batch: u64,
        total: u64,
        start: i64,
        end: i64,
        #[source]
        source: Box<SliceError>,
    },

    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error(transparent)]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error(transparent)]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
