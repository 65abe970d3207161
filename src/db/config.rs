use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONFIG_FILE, ENV_CONFIG_FILE, ENV_DATABASE, ENV_HOST, ENV_PASSWORD, ENV_PORT,
    ENV_URL, ENV_USER,
};
use crate::error::{Result, SliceError};

/// 데이터베이스 연결 설정
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_connection_timeout() -> u64 {
    30
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            connection_timeout_seconds: default_connection_timeout(),
        }
    }
}

/// 설정 출처
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigSource {
    /// --url 플래그
    Flag,
    /// 환경 변수
    Environment,
    /// 설정 파일
    File(PathBuf),
}

/// 데이터베이스 설정
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DbConfig {
    /// 연결 URL (있으면 connection 보다 우선)
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl DbConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            connection: ConnectionConfig::default(),
        }
    }

    /// 설정 파일에서 DB 설정 로드
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("DB 설정 파일 로드: {}", path.display());

        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: DbConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// 연결 설정 결정 (플래그 > PGSLICE_URL > 설정 파일)
    pub fn resolve(url: Option<&str>, config_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        Self::resolve_with(url, config_path, |key| env::var(key).ok())
    }

    /// 환경 변수 조회 함수를 주입받는 버전
    pub fn resolve_with<F>(
        url: Option<&str>,
        config_path: Option<&Path>,
        lookup: F,
    ) -> Result<(Self, ConfigSource)>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. --url 플래그
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            return Ok((Self::from_url(url), ConfigSource::Flag));
        }

        // 2. PGSLICE_URL 환경 변수
        if let Some(url) = lookup(ENV_URL).filter(|u| !u.is_empty()) {
            debug!("환경 변수 {} 에서 연결 URL 로드", ENV_URL);
            return Ok((Self::from_url(url), ConfigSource::Environment));
        }

        // 3. 설정 파일 (플래그 > PGSLICE_CONFIG > 현재 디렉토리 기본 파일)
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => match lookup(ENV_CONFIG_FILE) {
                Some(path) => Some(PathBuf::from(path)),
                None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
            },
        };

        match path {
            Some(path) => {
                let mut config = Self::load_from_file(&path)?;
                if config.url.is_some() {
                    // url 이 있으면 connection 항목은 사용되지 않음
                    debug!("설정 파일에 url 이 있어 환경 변수 연결 설정을 무시함");
                } else {
                    config.override_from_env(&lookup);
                }
                Ok((config, ConfigSource::File(path)))
            }
            None => Err(SliceError::Config(format!(
                "no database URL: use --url, set {} or provide {}",
                ENV_URL, DEFAULT_CONFIG_FILE
            ))),
        }
    }

    /// 환경 변수로 연결 설정 덮어쓰기
    pub fn override_from_env<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            debug!("환경 변수에서 DB 호스트 설정: {}", host);
            self.connection.host = host;
        }

        if let Some(port) = lookup(ENV_PORT) {
            match port.parse::<u16>() {
                Ok(port) => self.connection.port = port,
                Err(_) => warn!("환경 변수 {} 값이 유효한 포트 번호가 아님: {}", ENV_PORT, port),
            }
        }

        if let Some(database) = lookup(ENV_DATABASE) {
            self.connection.database = database;
        }

        if let Some(user) = lookup(ENV_USER) {
            self.connection.user = user;
        }

        if let Some(password) = lookup(ENV_PASSWORD) {
            debug!("환경 변수에서 DB 비밀번호 설정");
            self.connection.password = password;
        }
    }

    /// 로그용 연결 설명 (비밀번호 제외)
    pub fn describe(&self) -> String {
        match &self.url {
            Some(url) => match url.rsplit_once('@') {
                Some((_, host)) => format!("url ...@{}", host),
                None => "url".to_string(),
            },
            None => format!(
                "{}:{}/{} ({})",
                self.connection.host,
                self.connection.port,
                self.connection.database,
                self.connection.user
            ),
        }
    }
}
