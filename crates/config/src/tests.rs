use std::io::Write;

use crate::section::ConfigSection;
use crate::{
    ApiConfig, CacheConfig, ConfigError, ConfigRegistry, DatabaseConfig, DatabaseProvider,
    LogConfig, LogLevel, Section,
};

#[test]
fn test_api_bind_defaults() {
    let mut cfg = ApiConfig::default();
    cfg.bind().unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.health_check_endpoint, "/health");
    assert!(!cfg.ssl_enable);
    // ssl 未启用时不补 ssl 端口
    assert_eq!(cfg.ssl_port, 0);
}

#[test]
fn test_api_bind_ssl_port_default() {
    let mut cfg = ApiConfig {
        ssl_enable: true,
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert_eq!(cfg.ssl_port, 8443);
}

#[test]
fn test_api_validate_invalid_port() {
    let cfg = ApiConfig::default();
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidPort)));
}

#[test]
fn test_api_validate_ssl_cert_required() {
    let mut cfg = ApiConfig {
        ssl_enable: true,
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::SslCertFileRequired)
    ));
}

#[test]
fn test_api_validate_ssl_cert_not_found() {
    let mut cfg = ApiConfig {
        ssl_enable: true,
        ssl_cert_file: "/no/such/cert.pem".to_string(),
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::SslCertFileNotFound(_))
    ));
}

#[test]
fn test_api_validate_ssl_ok_with_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    let cert = dir.path().join("cert.pem");
    let key = dir.path().join("key.pem");
    writeln!(std::fs::File::create(&cert).unwrap(), "cert").unwrap();
    writeln!(std::fs::File::create(&key).unwrap(), "key").unwrap();

    let mut cfg = ApiConfig {
        ssl_enable: true,
        ssl_cert_file: cert.to_string_lossy().into_owned(),
        ssl_key_file: key.to_string_lossy().into_owned(),
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert!(cfg.validate().is_ok());
    assert!(cfg.ssl_port > 0);
}

#[test]
fn test_log_bind_defaults() {
    let mut cfg = LogConfig::default();
    cfg.bind().unwrap();
    assert_eq!(cfg.max_size, 500);
    assert_eq!(cfg.max_backups, 3);
    assert_eq!(cfg.max_age, 30);
    assert_eq!(cfg.log_level(), LogLevel::Debug);
    assert!(!cfg.file_enabled());
}

#[test]
fn test_log_bind_floors() {
    let mut cfg = LogConfig {
        max_size: 49,
        max_backups: 1,
        max_age: 1,
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert_eq!(cfg.max_size, 500);
    assert_eq!(cfg.max_backups, 3);
    assert_eq!(cfg.max_age, 30);

    let mut cfg = LogConfig {
        max_size: 64,
        max_backups: 5,
        max_age: 7,
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert_eq!(cfg.max_size, 64);
    assert_eq!(cfg.max_backups, 5);
    assert_eq!(cfg.max_age, 7);
}

#[test]
fn test_log_level_coercion() {
    let mut cfg = LogConfig {
        level: " WARN ".to_string(),
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert_eq!(cfg.log_level(), LogLevel::Warn);

    // 未识别的级别静默回落到 debug
    let mut cfg = LogConfig {
        level: "verbose".to_string(),
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert_eq!(cfg.log_level(), LogLevel::Debug);
}

#[test]
fn test_database_bind_defaults() {
    let mut cfg = DatabaseConfig {
        context_name: "  pg1  ".to_string(),
        provider: "Postgres".to_string(),
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert_eq!(cfg.context_name, "pg1");
    assert_eq!(cfg.provider, "postgres");
    assert_eq!(cfg.provider(), Some(DatabaseProvider::Postgres));
    assert_eq!(cfg.retry_limits, 30);
    assert_eq!(cfg.connection_max_life_time, 0);
    assert_eq!(cfg.max_idle_conns, 0);
    assert_eq!(cfg.max_open_conns, 0);
    assert!(cfg.max_lifetime().is_none());
}

#[test]
fn test_database_validate_errors() {
    let mut cfg = DatabaseConfig::default();
    cfg.bind().unwrap();
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::DbContextNameRequired)
    ));

    let mut cfg = DatabaseConfig {
        context_name: "pg1".to_string(),
        provider: "oracle".to_string(),
        ..Default::default()
    };
    cfg.bind().unwrap();
    match cfg.validate() {
        Err(ConfigError::InvalidDbProvider(p)) => assert_eq!(p, "oracle"),
        other => panic!("unexpected: {other:?}"),
    }

    let mut cfg = DatabaseConfig {
        context_name: "pg1".to_string(),
        provider: "postgres".to_string(),
        url: "localhost:5432".to_string(),
        user: "app".to_string(),
        password: "secret".to_string(),
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert!(matches!(cfg.validate(), Err(ConfigError::DbNameRequired)));

    cfg.database_name = "appdb".to_string();
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_cache_bind_zero_value_defaults() {
    let mut cfg = CacheConfig {
        context_name: "cache1".to_string(),
        endpoint: "localhost:6379".to_string(),
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert_eq!(cfg.db, 0);
    assert_eq!(cfg.pool_size, 10);
    assert_eq!(cfg.min_idle_conns, 5);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.min_retry_backoff, 8);
    assert_eq!(cfg.max_retry_backoff, 512);
    assert_eq!(cfg.max_idle_time, 30 * 60 * 1000);
    assert_eq!(cfg.read_timeout, 3000);
    assert_eq!(cfg.write_timeout, 3000);
    assert_eq!(cfg.pool_timeout, 4000);
}

#[test]
fn test_cache_bind_unit_scaling() {
    let mut cfg = CacheConfig {
        context_name: "cache1".to_string(),
        endpoint: "localhost:6379".to_string(),
        max_idle_time: 60,  // 分钟
        read_timeout: 5,    // 秒
        write_timeout: 7,   // 秒
        pool_timeout: 2,    // 秒
        min_retry_backoff: 16,
        max_retry_backoff: 1024,
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert_eq!(cfg.max_idle_time, 60 * 60 * 1000);
    assert_eq!(cfg.read_timeout, 5000);
    assert_eq!(cfg.write_timeout, 7000);
    assert_eq!(cfg.pool_timeout, 2000);
    // 退避字段本身就是毫秒，不做放大
    assert_eq!(cfg.min_retry_backoff, 16);
    assert_eq!(cfg.max_retry_backoff, 1024);
}

#[test]
fn test_cache_bind_sentinels() {
    let mut cfg = CacheConfig {
        context_name: "cache1".to_string(),
        endpoint: "localhost:6379".to_string(),
        max_retries: -1,
        min_retry_backoff: -1,
        max_retry_backoff: -1,
        max_idle_time: -1,
        read_timeout: -1,
        write_timeout: -2,
        ..Default::default()
    };
    cfg.bind().unwrap();
    assert_eq!(cfg.max_retries, -1);
    assert_eq!(cfg.min_retry_backoff, -1);
    assert_eq!(cfg.max_retry_backoff, -1);
    assert_eq!(cfg.max_idle_time, -1);
    assert_eq!(cfg.read_timeout, -1);
    assert_eq!(cfg.write_timeout, -2);

    assert!(cfg.retries().is_none());
    assert!(cfg.min_backoff().is_none());
    assert!(cfg.idle_time().is_none());
    assert!(cfg.read_deadline().is_none());
    assert!(cfg.write_deadline().is_none());
}

#[test]
fn test_cache_bind_is_idempotent() {
    let mut cfg = CacheConfig {
        context_name: "cache1".to_string(),
        endpoint: "localhost:6379".to_string(),
        max_idle_time: 45,
        read_timeout: 5,
        ..Default::default()
    };
    cfg.bind().unwrap();
    let first = cfg.clone();
    // 第二次 bind 不得再次放大已换算的分钟/秒字段
    cfg.bind().unwrap();
    assert_eq!(cfg.max_idle_time, first.max_idle_time);
    assert_eq!(cfg.read_timeout, first.read_timeout);
    assert_eq!(cfg.pool_timeout, first.pool_timeout);
}

#[test]
fn test_section_sum_type_delegates() {
    let mut section = Section::Cache(CacheConfig {
        context_name: "c".to_string(),
        endpoint: "localhost:6379".to_string(),
        ..Default::default()
    });
    section.bind().unwrap();
    section.validate().unwrap();
    let map = section.describe();
    assert_eq!(map["pool_size"], 10);
    assert_eq!(map["context_name"], "c");
}

#[test]
fn test_registry_load_and_lookup() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "service.toml",
            r#"
                [api_config]
                port = 9090

                [log_config]
                level = "info"

                [[databases]]
                context_name = "pg1"
                provider = "postgres"
                url = "localhost:5432"
                user = "app"
                password = "secret"
                database_name = "appdb"

                [[redis]]
                context_name = "cache1"
                endpoint = "localhost:6379"
            "#,
        )?;

        let registry = ConfigRegistry::load("service").expect("load");
        assert_eq!(registry.api().port, 9090);
        assert_eq!(registry.log().log_level(), LogLevel::Info);

        let db = registry.database("pg1").expect("pg1");
        assert_eq!(db.retry_limits, 30);
        assert_eq!(db.provider(), Some(DatabaseProvider::Postgres));
        assert!(registry.database("missing").is_none());

        let cache = registry.cache("cache1").expect("cache1");
        assert_eq!(cache.pool_size, 10);
        assert_eq!(registry.database_names(), vec!["pg1".to_string()]);
        assert_eq!(registry.cache_names(), vec!["cache1".to_string()]);
        Ok(())
    });
}

#[test]
fn test_registry_env_overrides_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "service.toml",
            r#"
                [api_config]
                port = 9090
            "#,
        )?;
        jail.set_env("API_CONFIG__PORT", "9999");

        let registry = ConfigRegistry::load("service").expect("load");
        assert_eq!(registry.api().port, 9999);
        Ok(())
    });
}

#[test]
fn test_registry_missing_sections_default() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("service.toml", "")?;
        let registry = ConfigRegistry::load("service").expect("load");
        assert_eq!(registry.api().port, 8080);
        assert!(registry.database_names().is_empty());
        assert!(registry.cache_names().is_empty());
        Ok(())
    });
}

#[test]
fn test_registry_duplicate_db_context_name_fails() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "service.toml",
            r#"
                [[databases]]
                context_name = "pg1"
                provider = "postgres"
                url = "localhost:5432"
                user = "app"
                password = "secret"
                database_name = "appdb"

                [[databases]]
                context_name = "pg1"
                provider = "mysql"
                url = "localhost:3306"
                user = "app"
                password = "secret"
                database_name = "appdb"
            "#,
        )?;
        match ConfigRegistry::load("service") {
            Err(ConfigError::DuplicateDbContextName(name)) => assert_eq!(name, "pg1"),
            other => panic!("unexpected: {other:?}"),
        }
        Ok(())
    });
}

#[test]
fn test_registry_duplicate_cache_context_name_fails() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "service.toml",
            r#"
                [[redis]]
                context_name = "cache1"
                endpoint = "localhost:6379"

                [[redis]]
                context_name = "cache1"
                endpoint = "localhost:6380"
            "#,
        )?;
        assert!(matches!(
            ConfigRegistry::load("service"),
            Err(ConfigError::DuplicateCacheContextName(_))
        ));
        Ok(())
    });
}

#[test]
fn test_registry_describe_is_redact_free() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "service.toml",
            r#"
                [[databases]]
                context_name = "pg1"
                provider = "postgres"
                url = "localhost:5432"
                user = "app"
                password = "secret"
                database_name = "appdb"
            "#,
        )?;
        let registry = ConfigRegistry::load("service").expect("load");
        let map = registry.describe();
        assert_eq!(map["db_configs"]["pg1"]["password"], "secret");
        assert_eq!(map["api_config"]["port"], 8080);
        Ok(())
    });
}
