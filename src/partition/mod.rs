// 파티션 경계 계산, 설정, 스키마 전파, 라우팅, 파티션 집합 관리
pub mod manager;
pub mod period;
pub mod routing;
pub mod schema;
pub mod settings;

pub use manager::{add_partitions, AddPartitionsOptions, PartitionDescriptor};
pub use period::Period;
pub use settings::{fetch_settings, Cast, PartitionSettings, Strategy};
