// 카탈로그 조회 SQL 상수
// `$1::text::regclass` 형태의 매개변수는 인용된 "schema"."table" 문자열을 받습니다.

/// 테이블 존재 여부 확인 쿼리
pub const TABLE_EXISTS: &str = "
    SELECT EXISTS (
        SELECT 1
        FROM pg_catalog.pg_tables
        WHERE schemaname = $1
        AND tablename = $2
    )";

/// 컬럼 목록 조회 쿼리 (정의 순서)
pub const COLUMNS: &str = "
    SELECT column_name::text
    FROM information_schema.columns
    WHERE table_schema = $1
    AND table_name = $2
    ORDER BY ordinal_position";

/// 컬럼 데이터 타입 조회 쿼리
pub const COLUMN_TYPE: &str = "
    SELECT data_type::text
    FROM information_schema.columns
    WHERE table_schema = $1
    AND table_name = $2
    AND column_name = $3";

/// 기본 키 컬럼 조회 쿼리 (키 순서)
pub const PRIMARY_KEY: &str = "
    SELECT pg_attribute.attname::text
    FROM pg_index, pg_class, pg_attribute, pg_namespace
    WHERE nspname = $1
    AND relname = $2
    AND indrelid = pg_class.oid
    AND pg_class.relnamespace = pg_namespace.oid
    AND pg_attribute.attrelid = pg_class.oid
    AND pg_attribute.attnum = any(pg_index.indkey)
    AND indisprimary
    ORDER BY array_position(pg_index.indkey::int2[], pg_attribute.attnum)";

/// 외래 키 정의 조회 쿼리
pub const FOREIGN_KEYS: &str = "
    SELECT pg_get_constraintdef(oid)
    FROM pg_constraint
    WHERE conrelid = $1::text::regclass
    AND contype = 'f'
    ORDER BY conname";

/// 기본 키 이외 인덱스 정의 조회 쿼리
pub const INDEX_DEFS: &str = "
    SELECT pg_get_indexdef(indexrelid)
    FROM pg_index
    WHERE indrelid = $1::text::regclass
    AND indisprimary = 'f'
    ORDER BY indexrelid";

/// 테이블 소유 시퀀스 조회 쿼리
pub const SEQUENCES: &str = "
    SELECT
        n.nspname::text AS schema,
        s.relname::text AS name,
        a.attname::text AS column
    FROM pg_class s
        JOIN pg_depend d ON d.objid = s.oid
        JOIN pg_class t ON d.objid = s.oid AND d.refobjid = t.oid
        JOIN pg_attribute a ON (d.refobjid, d.refobjsubid) = (a.attrelid, a.attnum)
        JOIN pg_namespace n ON n.oid = s.relnamespace
        JOIN pg_namespace tn ON tn.oid = t.relnamespace
    WHERE s.relkind = 'S'
    AND tn.nspname = $1
    AND t.relname = $2
    ORDER BY s.relname";

/// 상속 자식 (파티션) 목록 조회 쿼리 - 이름순
pub const PARTITIONS: &str = "
    SELECT
        nmsp_child.nspname::text AS schema,
        child.relname::text AS name
    FROM pg_inherits
        JOIN pg_class parent ON pg_inherits.inhparent = parent.oid
        JOIN pg_class child ON pg_inherits.inhrelid = child.oid
        JOIN pg_namespace nmsp_parent ON nmsp_parent.oid = parent.relnamespace
        JOIN pg_namespace nmsp_child ON nmsp_child.oid = child.relnamespace
    WHERE nmsp_parent.nspname = $1
    AND parent.relname = $2
    ORDER BY child.relname";

/// 테이블 주석 조회 쿼리
pub const TABLE_COMMENT: &str = "
    SELECT COALESCE(obj_description($1::text::regclass, 'pg_class'), '')";

/// 트리거 주석 조회 쿼리
pub const TRIGGER_COMMENT: &str = "
    SELECT COALESCE(obj_description(oid, 'pg_trigger'), '')
    FROM pg_trigger
    WHERE tgname = $1
    AND tgrelid = $2::text::regclass";

/// 서버 버전 번호 조회 쿼리
pub const SERVER_VERSION_NUM: &str = "SELECT current_setting('server_version_num')::int";
