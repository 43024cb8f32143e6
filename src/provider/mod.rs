//! 翻译后端抽象
//!
//! 把形态各异的 chat-completion 接口（请求头、代理、system 角色支持）
//! 统一到一个 `translate(句子, 目标词) -> 译文` 契约之后。
//! 后端由配置驱动构造，进程默认使用激活档案，边界层可按请求合并覆盖值
//! 构造一次性后端，共享状态保持不可变。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{AppConfig, ProviderConfig};
use crate::error::TranslateResult;

pub mod chat;

pub use chat::ChatCompletionProvider;

/// 翻译后端接口
///
/// 实现方负责构造提示词、调用外部接口并抽取译文；
/// 失败直接上抛给编排层，内部不做重试。
#[async_trait]
pub trait TranslateProvider: Send + Sync {
    /// 翻译句子中目标词在该语境下的含义
    async fn translate(&self, sentence: &str, target_word: &str) -> TranslateResult<String>;

    /// 后端名称，用于日志与展示
    fn name(&self) -> &str;
}

/// 按应用配置构造激活档案对应的后端
pub fn build_active_provider(config: &AppConfig) -> TranslateResult<Arc<dyn TranslateProvider>> {
    let provider = ChatCompletionProvider::new(
        config.active_provider().clone(),
        config.request_timeout(),
        config.max_result_chars,
    )?;
    Ok(Arc::new(provider))
}

/// 请求内联的后端覆盖参数
///
/// 字段名沿用对外 API 的约定（`model_name` 而非 `model`），
/// 缺省字段回落到激活档案的值。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderOverride {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub system_prompt: Option<String>,
    pub user_prompt_template: Option<String>,
}

impl ProviderOverride {
    /// 是否未携带任何覆盖值
    pub fn is_empty(&self) -> bool {
        self.api_url.is_none()
            && self.api_key.is_none()
            && self.model_name.is_none()
            && self.system_prompt.is_none()
            && self.user_prompt_template.is_none()
    }

    /// 将覆盖值合并到基础档案上，产生一次性的后端配置
    pub fn merge_into(&self, base: &ProviderConfig) -> ProviderConfig {
        let mut merged = base.clone();
        merged.name = format!("{}+override", base.name);

        if let Some(api_url) = &self.api_url {
            merged.api_url = api_url.clone();
        }
        if let Some(api_key) = &self.api_key {
            merged.api_key = api_key.clone();
        }
        if let Some(model) = &self.model_name {
            merged.model = model.clone();
        }
        if let Some(system_prompt) = &self.system_prompt {
            merged.system_prompt = system_prompt.clone();
        }
        if let Some(template) = &self.user_prompt_template {
            merged.user_prompt_template = template.clone();
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_override_keeps_base() {
        let base = ProviderConfig::default();
        let merged = ProviderOverride::default().merge_into(&base);

        assert_eq!(merged.api_url, base.api_url);
        assert_eq!(merged.model, base.model);
        assert_eq!(merged.system_prompt, base.system_prompt);
        assert!(ProviderOverride::default().is_empty());
    }

    #[test]
    fn test_partial_override_merges() {
        let base = ProviderConfig::default();
        let over = ProviderOverride {
            model_name: Some("qwen-max".to_string()),
            api_key: Some("sk-inline".to_string()),
            ..Default::default()
        };

        let merged = over.merge_into(&base);
        assert_eq!(merged.model, "qwen-max");
        assert_eq!(merged.api_key, "sk-inline");
        // 未覆盖的字段保持基础档案的值
        assert_eq!(merged.api_url, base.api_url);
        assert_eq!(merged.user_prompt_template, base.user_prompt_template);
        assert!(!over.is_empty());
    }
}
