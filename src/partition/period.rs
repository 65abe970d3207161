use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};

use crate::constants::PARTITION_SEPARATOR;
use crate::error::{Result, SliceError};
use crate::partition::settings::Cast;

/// 파티션 주기
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// 파티션 이름 접미사 형식 (day: YYYYMMDD, month: YYYYMM, year: YYYY)
    pub fn name_format(&self) -> &'static str {
        match self {
            Period::Day => "%Y%m%d",
            Period::Month => "%Y%m",
            Period::Year => "%Y",
        }
    }

    /// 접미사 자릿수
    fn suffix_len(&self) -> usize {
        match self {
            Period::Day => 8,
            Period::Month => 6,
            Period::Year => 4,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "day" => Ok(Period::Day),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            other => Err(SliceError::InvalidPeriod(other.to_string())),
        }
    }
}

/// UTC 기준 주기 시작일로 내림
pub fn round_date(now: DateTime<Utc>, period: Period) -> NaiveDate {
    let date = now.date_naive();
    match period {
        Period::Day => date,
        Period::Month => date.with_day(1).unwrap_or(date),
        Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

/// 주기 단위로 n 만큼 이동 (음수는 과거)
pub fn advance(date: NaiveDate, period: Period, count: i64) -> Result<NaiveDate> {
    let advanced = match period {
        Period::Day => date.checked_add_signed(Duration::days(count)),
        Period::Month => shift_months(date, count),
        Period::Year => count.checked_mul(12).and_then(|months| shift_months(date, months)),
    };

    advanced.ok_or_else(|| {
        SliceError::DateOutOfRange(format!("{} {} {}", date, count, period))
    })
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let delta = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(delta)
    } else {
        date.checked_sub_months(delta)
    }
}

/// 파티션 이름 생성 (base_YYYYMMDD 등)
pub fn partition_name(base: &str, date: NaiveDate, period: Period) -> String {
    format!(
        "{}{}{}",
        base,
        PARTITION_SEPARATOR,
        date.format(period.name_format())
    )
}

/// 파티션 이름의 마지막 구분자 뒤 접미사를 날짜로 해석
pub fn partition_date(name: &str, period: Period) -> Result<NaiveDate> {
    let invalid = || SliceError::PartitionName(format!("{} (expected {} suffix)", name, period));

    let suffix = name
        .rsplit_once(PARTITION_SEPARATOR)
        .map(|(_, suffix)| suffix)
        .ok_or_else(invalid)?;

    if suffix.len() != period.suffix_len() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    // chrono는 일자 없는 형식을 날짜로 해석하지 않으므로 부족한 자리를 채움
    let padded = match period {
        Period::Day => suffix.to_string(),
        Period::Month => format!("{}01", suffix),
        Period::Year => format!("{}0101", suffix),
    };

    NaiveDate::parse_from_str(&padded, "%Y%m%d").map_err(|_| invalid())
}

/// SQL 날짜 리터럴 생성
pub fn sql_date(date: NaiveDate, cast: Cast, add_cast: bool) -> String {
    let literal = match cast {
        Cast::Date => format!("'{}'", date.format("%Y-%m-%d")),
        Cast::Timestamptz => format!("'{} 00:00:00 UTC'", date.format("%Y-%m-%d")),
    };

    if add_cast {
        format!("{}::{}", literal, cast)
    } else {
        literal
    }
}
