/// SQL 식별자 인용 - 항상 큰따옴표로 감싸고 내부 따옴표는 이중화
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// SQL 문자열 리터럴 인용
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// 컬럼 목록 인용 후 쉼표로 연결
pub fn quote_columns<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
