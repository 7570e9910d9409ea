use crate::error::ConfigError;
use crate::models::prompt::PromptSet;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载提示词，文件中缺失的项使用内置默认值
pub async fn load_prompt_set(toml_file_path: &Path) -> Result<PromptSet, ConfigError> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| ConfigError::Prompts {
            path: toml_file_path.display().to_string(),
            message: e.to_string(),
        })?;

    let prompts: PromptSet = toml::from_str(&content).map_err(|e| ConfigError::Prompts {
        path: toml_file_path.display().to_string(),
        message: e.to_string(),
    })?;

    tracing::info!("已加载提示词文件: {}", toml_file_path.display());

    Ok(prompts)
}

/// 按配置加载提示词：未指定文件时使用内置提示词
pub async fn load_prompts_or_default(path: Option<&str>) -> Result<PromptSet, ConfigError> {
    match path {
        Some(path) => load_prompt_set(Path::new(path)).await,
        None => Ok(PromptSet::default()),
    }
}
