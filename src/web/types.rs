//! Web 层的共享状态与请求/响应类型

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::provider::ProviderOverride;
use crate::service::TranslateService;

/// 应用共享状态
///
/// 配置在进程启动时冻结，服务本身无共享可变状态，
/// 整个状态可被并发请求安全共享。
pub struct AppState {
    pub config: AppConfig,
    pub service: TranslateService,
}

/// 翻译请求
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub sentence: String,

    /// 请求内联的后端覆盖参数，缺省时使用进程默认后端
    #[serde(default)]
    pub api_config: Option<ProviderOverride>,
}

/// 翻译响应
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub original_sentence: String,
    pub target_word: String,
    pub translation: String,
    pub from_cache: bool,
    pub word_frequency: u64,
}

/// 配置展示响应，API 密钥只返回掩码后的形式
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub active_provider: String,
    pub api_url: String,
    pub model: String,
    pub api_key_masked: String,
    pub use_system_role: bool,
    pub system_prompt: String,
    pub user_prompt_template: String,
}

/// 缓存清理响应
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: String,
}
