use crate::variable::dotenv::parse_dotenv;
use crate::variable::resolver::VariableResolver;
use crate::variable::types::Environment;
use crate::{ReqcraftError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 项目配置文件 `reqcraft.toml`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// 所有环境配置
    #[serde(default)]
    pub environments: HashMap<String, Environment>,

    #[serde(default)]
    pub history: HistorySettings,
}

impl ProjectConfig {
    /// 获取指定环境的变量
    pub fn get_environment(&self, env_name: &str) -> Option<&Environment> {
        self.environments.get(env_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_history_enabled")]
    pub enabled: bool,

    /// 历史记录目录，`REQCRAFT_HISTORY_DIR` 优先
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_history_enabled() -> bool {
    true
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            enabled: default_history_enabled(),
            dir: None,
        }
    }
}

/// 环境叠加选项，按字段顺序从低到高覆盖
#[derive(Debug, Clone)]
pub struct EnvironmentOptions {
    /// 是否以进程环境变量作为最底层
    pub include_process: bool,
    /// `.env` 文件路径，文件不存在时跳过
    pub dotenv_path: Option<PathBuf>,
    /// `reqcraft.toml` 中的环境名称
    pub env_name: Option<String>,
    /// 显式指定的环境文件，必须存在
    pub env_file: Option<PathBuf>,
    /// CLI 传入的变量覆盖（--var key=value）
    pub cli_vars: Vec<(String, String)>,
}

impl Default for EnvironmentOptions {
    fn default() -> Self {
        Self {
            include_process: true,
            dotenv_path: Some(PathBuf::from(".env")),
            env_name: None,
            env_file: None,
            cli_vars: Vec::new(),
        }
    }
}

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    const CONFIG_FILE: &'static str = "reqcraft.toml";

    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ReqcraftError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// 查找并加载配置文件
    /// 查找顺序：
    /// 1. 当前目录及父目录
    /// 2. 用户配置目录 ~/.config/reqcraft/
    pub fn find_and_load() -> Result<Option<ProjectConfig>> {
        match Self::find_config_path() {
            Some(path) => {
                debug!(path = %path.display(), "loading project config");
                Self::load_from_path(&path).map(Some)
            }
            None => Ok(None),
        }
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Ok(mut current) = std::env::current_dir() {
            loop {
                let config_path = current.join(Self::CONFIG_FILE);
                if config_path.exists() {
                    return Some(config_path);
                }

                if !current.pop() {
                    break;
                }
            }
        }

        let home = dirs::home_dir()?;
        let config_path = home.join(".config").join("reqcraft").join(Self::CONFIG_FILE);
        config_path.exists().then_some(config_path)
    }

    /// 加载单个环境文件
    ///
    /// - `.json`: 扁平对象，非字符串标量转为文本
    /// - `.toml`: 扁平表
    /// - 其他: dotenv 格式
    pub fn load_env_file<P: AsRef<Path>>(path: P) -> Result<Environment> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ReqcraftError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let value: serde_json::Value = serde_json::from_str(&content)?;
                flatten_scalars(&value, path)
            }
            Some("toml") => {
                let value: toml::Table = toml::from_str(&content)?;
                let value = serde_json::to_value(value)?;
                flatten_scalars(&value, path)
            }
            _ => Ok(parse_dotenv(&content)),
        }
    }

    /// 按层构建最终环境
    pub fn build_environment(
        config: &ProjectConfig,
        options: &EnvironmentOptions,
    ) -> Result<Environment> {
        let mut env = if options.include_process {
            Environment::from_process()
        } else {
            Environment::new()
        };

        if let Some(dotenv_path) = options.dotenv_path.as_deref().filter(|p| p.exists()) {
            debug!(path = %dotenv_path.display(), "loading .env file");
            env.layer(Self::load_env_file(dotenv_path)?);
        }

        if let Some(name) = options.env_name.as_deref() {
            let named = config.get_environment(name).ok_or_else(|| {
                ReqcraftError::Config(format!("environment '{}' not found in {}", name, Self::CONFIG_FILE))
            })?;
            for (key, value) in named.iter() {
                // 解析系统环境变量 ${VAR}
                env.insert(key, VariableResolver::resolve_env_vars(value));
            }
        }

        if let Some(env_file) = options.env_file.as_deref() {
            env.layer(Self::load_env_file(env_file)?);
        }

        // 应用 CLI 覆盖（优先级最高）
        env.extend(options.cli_vars.iter().cloned());

        Ok(env)
    }

    /// 解析 CLI 变量参数 "key=value"
    pub fn parse_cli_var(s: &str) -> Option<(String, String)> {
        s.split_once('=')
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    }
}

fn flatten_scalars(value: &serde_json::Value, path: &Path) -> Result<Environment> {
    let object = value.as_object().ok_or_else(|| {
        ReqcraftError::Config(format!("{} must contain a flat key/value object", path.display()))
    })?;

    let mut env = Environment::new();
    for (key, value) in object {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(_) | serde_json::Value::Bool(_) => value.to_string(),
            serde_json::Value::Null => String::new(),
            _ => {
                return Err(ReqcraftError::Config(format!(
                    "{}: variable '{}' must be a scalar",
                    path.display(),
                    key
                )));
            }
        };
        env.insert(key.clone(), text);
    }
    Ok(env)
}
