//! API 服务配置

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::section::{ConfigSection, to_map};
use crate::ConfigError;

/// 默认 HTTP 端口
pub const DEFAULT_PORT: u16 = 8080;
/// 默认健康检查路径
pub const DEFAULT_HEALTH_CHECK_ENDPOINT: &str = "/health";
/// 默认 HTTPS 端口
pub const DEFAULT_SSL_PORT: u16 = 8443;

/// API 配置（`[api_config]` 段）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// HTTP 监听端口
    pub port: u16,
    /// 健康检查路径
    pub health_check_endpoint: String,
    /// 仅提供 HTTPS
    pub https_only: bool,
    /// 启用 TLS 监听
    pub ssl_enable: bool,
    /// HTTPS 监听端口
    pub ssl_port: u16,
    /// 证书文件路径
    pub ssl_cert_file: String,
    /// 私钥文件路径
    pub ssl_key_file: String,
    #[serde(skip)]
    pub(crate) bound: bool,
}

impl ConfigSection for ApiConfig {
    fn bind(&mut self) -> Result<(), ConfigError> {
        if self.bound {
            return Ok(());
        }
        if self.port == 0 {
            self.port = DEFAULT_PORT;
        }
        self.health_check_endpoint = self.health_check_endpoint.trim().to_string();
        if self.health_check_endpoint.is_empty() {
            self.health_check_endpoint = DEFAULT_HEALTH_CHECK_ENDPOINT.to_string();
        }
        if self.ssl_enable && self.ssl_port == 0 {
            self.ssl_port = DEFAULT_SSL_PORT;
        }
        self.bound = true;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.ssl_enable || self.https_only {
            if self.ssl_port == 0 {
                return Err(ConfigError::InvalidSslPort);
            }
            if self.ssl_cert_file.trim().is_empty() {
                return Err(ConfigError::SslCertFileRequired);
            }
            if !Path::new(&self.ssl_cert_file).is_file() {
                return Err(ConfigError::SslCertFileNotFound(self.ssl_cert_file.clone()));
            }
            if self.ssl_key_file.trim().is_empty() {
                return Err(ConfigError::SslKeyFileRequired);
            }
            if !Path::new(&self.ssl_key_file).is_file() {
                return Err(ConfigError::SslKeyFileNotFound(self.ssl_key_file.clone()));
            }
        }
        Ok(())
    }

    fn describe(&self) -> Map<String, Value> {
        to_map(self)
    }
}
