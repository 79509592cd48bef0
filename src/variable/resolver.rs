use crate::variable::types::Environment;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// 变量替换器
pub struct VariableResolver;

impl VariableResolver {
    /// 替换文本中的所有 {{variable}} 占位符
    ///
    /// 环境中不存在的变量保持原样；替换进来的值不会被再次扫描。
    pub fn interpolate(text: &str, env: &Environment) -> String {
        static VAR_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = VAR_REGEX.get_or_init(|| {
            Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("variable pattern is valid")
        });

        re.replace_all(text, |caps: &Captures| {
            let var_name = &caps[1];
            env.get(var_name).unwrap_or(&caps[0]).to_string()
        })
        .into_owned()
    }

    /// 解析并替换系统环境变量 ${VAR}
    pub fn resolve_env_vars(text: &str) -> String {
        static ENV_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = ENV_REGEX.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env pattern is valid")
        });

        re.replace_all(text, |caps: &Captures| {
            let env_name = &caps[1];
            std::env::var(env_name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
    }
}
