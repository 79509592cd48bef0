use reqcraft::ReqcraftError;
use reqcraft::variable::{ConfigLoader, Environment, EnvironmentOptions, VariableResolver};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// 不读取进程环境和 .env，只测试配置本身
fn isolated_options(env_name: Option<&str>) -> EnvironmentOptions {
    EnvironmentOptions {
        include_process: false,
        dotenv_path: None,
        env_name: env_name.map(str::to_string),
        ..EnvironmentOptions::default()
    }
}

/// 测试从实际配置文件加载变量
#[test]
fn test_load_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("reqcraft.toml");

    let config_content = r#"
[environments.dev]
base_url = "http://localhost:3000"
api_key = "dev-key-123"

[environments.prod]
base_url = "https://api.example.com"
api_key = "${PROD_API_KEY}"

[history]
enabled = false
dir = "/tmp/reqcraft"
"#;

    fs::write(&config_path, config_content).unwrap();

    let config = ConfigLoader::load_from_path(&config_path).unwrap();
    assert!(config.environments.contains_key("dev"));
    assert!(config.environments.contains_key("prod"));

    let dev_env = &config.environments["dev"];
    assert_eq!(dev_env.get("base_url"), Some("http://localhost:3000"));
    assert_eq!(dev_env.get("api_key"), Some("dev-key-123"));

    assert!(!config.history.enabled);
    assert_eq!(config.history.dir, Some(PathBuf::from("/tmp/reqcraft")));
}

/// 测试多环境切换
#[test]
fn test_multi_environment_switching() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("reqcraft.toml");

    let config_content = r#"
[environments.dev]
base_url = "http://localhost:3000"
db_name = "dev_db"

[environments.prod]
base_url = "https://api.example.com"
db_name = "prod_db"
"#;

    fs::write(&config_path, config_content).unwrap();
    let config = ConfigLoader::load_from_path(&config_path).unwrap();

    let env = ConfigLoader::build_environment(&config, &isolated_options(Some("dev"))).unwrap();
    assert_eq!(
        VariableResolver::interpolate("{{base_url}}/{{db_name}}", &env),
        "http://localhost:3000/dev_db"
    );

    let env = ConfigLoader::build_environment(&config, &isolated_options(Some("prod"))).unwrap();
    assert_eq!(
        VariableResolver::interpolate("{{base_url}}/{{db_name}}", &env),
        "https://api.example.com/prod_db"
    );

    // 不指定环境时为空
    let env = ConfigLoader::build_environment(&config, &isolated_options(None)).unwrap();
    assert!(env.is_empty());
}

#[test]
fn test_unknown_environment_is_config_error() {
    let config = Default::default();
    let err = ConfigLoader::build_environment(&config, &isolated_options(Some("staging")))
        .unwrap_err();
    assert!(matches!(err, ReqcraftError::Config(_)));
}

/// 测试各层的覆盖顺序：.env < 命名环境 < 环境文件 < CLI
#[test]
fn test_layering_priority() {
    let temp_dir = TempDir::new().unwrap();

    let dotenv_path = temp_dir.path().join(".env");
    fs::write(
        &dotenv_path,
        "# local secrets\nTOKEN=dotenv-token\nHOST=dotenv-host\nONLY_DOTENV=1\n",
    )
    .unwrap();

    let config_path = temp_dir.path().join("reqcraft.toml");
    fs::write(
        &config_path,
        r#"
[environments.dev]
HOST = "config-host"
TOKEN = "config-token"
"#,
    )
    .unwrap();

    let env_file = temp_dir.path().join("override.json");
    fs::write(&env_file, r#"{"TOKEN": "file-token", "PORT": 8080, "DEBUG": true}"#).unwrap();

    let config = ConfigLoader::load_from_path(&config_path).unwrap();
    let options = EnvironmentOptions {
        include_process: false,
        dotenv_path: Some(dotenv_path),
        env_name: Some("dev".to_string()),
        env_file: Some(env_file),
        cli_vars: vec![("HOST".to_string(), "cli-host".to_string())],
    };

    let env = ConfigLoader::build_environment(&config, &options).unwrap();
    assert_eq!(env.get("ONLY_DOTENV"), Some("1"));
    assert_eq!(env.get("TOKEN"), Some("file-token"));
    assert_eq!(env.get("HOST"), Some("cli-host"));
    assert_eq!(env.get("PORT"), Some("8080"));
    assert_eq!(env.get("DEBUG"), Some("true"));
}

#[test]
fn test_toml_env_file() {
    let temp_dir = TempDir::new().unwrap();
    let env_file = temp_dir.path().join("vars.toml");
    fs::write(&env_file, "base = \"http://x\"\nretries = 3\n").unwrap();

    let env = ConfigLoader::load_env_file(&env_file).unwrap();
    assert_eq!(env.get("base"), Some("http://x"));
    assert_eq!(env.get("retries"), Some("3"));
}

#[test]
fn test_nested_env_file_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let env_file = temp_dir.path().join("vars.json");
    fs::write(&env_file, r#"{"nested": {"a": 1}}"#).unwrap();

    assert!(matches!(
        ConfigLoader::load_env_file(&env_file),
        Err(ReqcraftError::Config(_))
    ));
}

#[test]
fn test_missing_env_file_is_config_error() {
    let options = EnvironmentOptions {
        env_file: Some(PathBuf::from("/nonexistent/vars.env")),
        ..isolated_options(None)
    };
    assert!(matches!(
        ConfigLoader::build_environment(&Default::default(), &options),
        Err(ReqcraftError::Config(_))
    ));
}

/// 测试环境变量解析
#[test]
fn test_environment_variable_resolution() {
    unsafe {
        std::env::set_var("REQCRAFT_TEST_ENV_VAR", "environment-value");
    }

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("reqcraft.toml");
    fs::write(
        &config_path,
        r#"
[environments.dev]
api_key = "${REQCRAFT_TEST_ENV_VAR}"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_path(&config_path).unwrap();
    let env = ConfigLoader::build_environment(&config, &isolated_options(Some("dev"))).unwrap();

    assert_eq!(
        VariableResolver::interpolate("{{api_key}}", &env),
        "environment-value"
    );

    unsafe {
        std::env::remove_var("REQCRAFT_TEST_ENV_VAR");
    }
}

/// 测试缺失变量的处理
#[test]
fn test_missing_variable_handling() {
    let mut env = Environment::new();
    env.insert("defined", "value");

    let result = VariableResolver::interpolate("{{defined}} and {{undefined}}", &env);
    assert_eq!(result, "value and {{undefined}}");
}

/// 测试空配置文件
#[test]
fn test_empty_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("reqcraft.toml");

    fs::write(&config_path, "").unwrap();

    let config = ConfigLoader::load_from_path(&config_path).unwrap();
    assert!(config.environments.is_empty());
    assert!(config.history.enabled);
}

/// 测试 CLI 变量解析格式
#[test]
fn test_cli_variable_parsing() {
    let (k, v) = ConfigLoader::parse_cli_var("key2=value with spaces").unwrap();
    assert_eq!(k, "key2");
    assert_eq!(v, "value with spaces");

    let (k, v) = ConfigLoader::parse_cli_var("key3=value=with=equals").unwrap();
    assert_eq!(k, "key3");
    assert_eq!(v, "value=with=equals");

    assert!(ConfigLoader::parse_cli_var("no-separator").is_none());
}
