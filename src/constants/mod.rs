// 카탈로그 조회 SQL 모듈
pub mod catalog;

// 테이블 이름 규칙
pub const DEFAULT_SCHEMA: &str = "public";
pub const INTERMEDIATE_SUFFIX: &str = "_intermediate";
pub const RETIRED_SUFFIX: &str = "_retired";
pub const TRIGGER_SUFFIX: &str = "_insert_trigger";
pub const PARTITION_SEPARATOR: char = '_';

// 서버 버전 기준 (server_version_num)
pub const DECLARATIVE_MIN_VERSION: i32 = 100000;        // 선언적 파티셔닝 (PG 10)
pub const INDEX_PROPAGATION_MIN_VERSION: i32 = 110000;  // 파티션 인덱스 자동 전파 (PG 11)
pub const LOCK_TIMEOUT_MIN_VERSION: i32 = 90300;        // lock_timeout 지원 (PG 9.3)

// fill 기본값
pub const DEFAULT_BATCH_SIZE: i64 = 10000;

// swap 기본 잠금 대기 시간
pub const DEFAULT_LOCK_TIMEOUT: &str = "5s";

// 파티션 설정 주석 시작 키
pub const SETTINGS_COMMENT_PREFIX: &str = "column:";

// 라우팅 함수 오류 메시지
pub const ROUTING_OUT_OF_RANGE_MESSAGE: &str = "Date out of range. Ensure partitions are created.";
pub const ROUTING_PLACEHOLDER_MESSAGE: &str = "Create partitions first.";

// 설정 파일 및 환경 변수
pub const DEFAULT_CONFIG_FILE: &str = "pgslice.yml";
pub const ENV_URL: &str = "PGSLICE_URL";
pub const ENV_CONFIG_FILE: &str = "PGSLICE_CONFIG";
pub const ENV_HOST: &str = "PGSLICE_HOST";
pub const ENV_PORT: &str = "PGSLICE_PORT";
pub const ENV_DATABASE: &str = "PGSLICE_DATABASE";
pub const ENV_USER: &str = "PGSLICE_USER";
pub const ENV_PASSWORD: &str = "PGSLICE_PASSWORD";
