//! API 处理器

use std::sync::Arc;

use axum::{
    extract::{Json as ExtractJson, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::error::TranslateError;
use crate::provider::ChatCompletionProvider;
use crate::web::types::{
    AppState, ClearResponse, ConfigResponse, TranslateRequest, TranslateResponse,
};

type ApiError = (StatusCode, Json<Value>);

/// 将领域错误映射为 HTTP 响应
///
/// 输入问题归 4xx；外部接口的传输、解析与超长结果都按上游故障
/// 返回 502；存储与配置问题是服务自身的 500。
fn error_response(error: TranslateError) -> ApiError {
    let status = match &error {
        TranslateError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TranslateError::NoCandidateWords => StatusCode::NOT_FOUND,
        TranslateError::ProviderTransport(_)
        | TranslateError::ProviderParse(_)
        | TranslateError::ResultTooLong { .. } => StatusCode::BAD_GATEWAY,
        TranslateError::Persistence(_) | TranslateError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        tracing::error!("请求处理失败: {}", error);
    } else {
        tracing::debug!("请求被拒绝: {}", error);
    }

    (status, Json(json!({ "error": error.to_string() })))
}

/// POST /translate — 选词并翻译
///
/// 携带 `api_config` 时按合并后的配置构造一次性后端，
/// 进程默认后端与全局配置保持不变。
pub async fn translate(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let sentence = request.sentence.trim().to_string();

    let outcome = match request.api_config.as_ref().filter(|o| !o.is_empty()) {
        Some(override_config) => {
            let merged = override_config.merge_into(state.config.active_provider());
            let provider = ChatCompletionProvider::new(
                merged,
                state.config.request_timeout(),
                state.config.max_result_chars,
            )
            .map_err(error_response)?;

            state
                .service
                .translate_with(&sentence, &provider)
                .await
                .map_err(error_response)?
        }
        None => state
            .service
            .translate(&sentence)
            .await
            .map_err(error_response)?,
    };

    tracing::info!(
        "翻译完成: {} -> {} (缓存: {}, 次数: {})",
        outcome.target_word,
        outcome.translation,
        outcome.from_cache,
        outcome.word_frequency
    );

    Ok(Json(TranslateResponse {
        original_sentence: sentence,
        target_word: outcome.target_word,
        translation: outcome.translation,
        from_cache: outcome.from_cache,
        word_frequency: outcome.word_frequency,
    }))
}

/// GET /config — 展示当前激活的后端配置，密钥做掩码处理
pub async fn show_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let provider = state.config.active_provider();

    Json(ConfigResponse {
        active_provider: provider.name.clone(),
        api_url: provider.api_url.clone(),
        model: provider.model.clone(),
        api_key_masked: provider.masked_api_key(),
        use_system_role: provider.use_system_role,
        system_prompt: provider.system_prompt.clone(),
        user_prompt_template: provider.user_prompt_template.clone(),
    })
}

/// POST /cache/clear — 联合清空翻译缓存与词频数据
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearResponse>, ApiError> {
    state.service.clear_data().map_err(error_response)?;
    tracing::info!("缓存与词频数据已清空");

    Ok(Json(ClearResponse {
        message: "缓存与词频数据已清空".to_string(),
    }))
}

/// GET /cache/status — 存储状态快照
pub async fn cache_status(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let status = state.service.store_status().map_err(error_response)?;
    Ok(Json(json!({
        "cache_entries": status.cache_entries,
        "frequency_entries": status.frequency_entries,
        "persistent": status.persistent,
        "path": status.path,
    })))
}
