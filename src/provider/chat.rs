//! chat-completion 后端客户端
//!
//! 按后端档案构造请求（消息角色、鉴权头、自定义头、代理、超时），
//! 从 chat-completion 形态的响应中抽取第一个 choice 的消息内容作为译文。
//! 超长结果按独立的失败条件拒绝：模型很可能附带了多余的解释而非单个译词。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{TranslateError, TranslateResult};
use crate::provider::TranslateProvider;

/// chat-completion 请求体
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

/// 对话消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: String) -> Self {
        Self {
            role: "system".to_string(),
            content,
        }
    }

    fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// chat-completion 响应体，仅反序列化用到的字段
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// 配置驱动的 chat-completion 翻译后端
///
/// 构造时冻结全部请求参数：HTTP 客户端带超时与可选代理，
/// 请求头（含鉴权与自定义头）只组装一次。调用方放弃请求时
/// reqwest 随 future 一起取消底层连接，不会产生部分缓存写入。
pub struct ChatCompletionProvider {
    config: ProviderConfig,
    client: reqwest::Client,
    headers: HeaderMap,
    max_result_chars: usize,
}

impl ChatCompletionProvider {
    /// 从后端档案构造客户端
    pub fn new(
        config: ProviderConfig,
        timeout: Duration,
        max_result_chars: usize,
    ) -> TranslateResult<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| TranslateError::Config(format!("代理地址无效: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TranslateError::Config(format!("构造 HTTP 客户端失败: {}", e)))?;

        let headers = build_headers(&config)?;

        Ok(Self {
            config,
            client,
            headers,
            max_result_chars,
        })
    }

    /// 组装对话消息
    ///
    /// 后端支持 system 角色时发送 system + user 两条消息；
    /// 否则把系统指令并入用户消息，兼容拒绝 system 角色的后端。
    fn build_messages(&self, sentence: &str, target_word: &str) -> Vec<ChatMessage> {
        let user_prompt = self.config.render_user_prompt(sentence, target_word);

        if self.config.use_system_role {
            vec![
                ChatMessage::system(self.config.system_prompt.clone()),
                ChatMessage::user(user_prompt),
            ]
        } else {
            vec![ChatMessage::user(format!(
                "{}\n{}",
                self.config.system_prompt, user_prompt
            ))]
        }
    }
}

/// 组装请求头：自定义头在前，鉴权头在后
///
/// 空的 api_key 表示该后端无需鉴权，不附加 Authorization 头。
fn build_headers(config: &ProviderConfig) -> TranslateResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| TranslateError::Config(format!("请求头名称 '{}' 无效: {}", key, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TranslateError::Config(format!("请求头 '{}' 的值无效: {}", key, e)))?;
        headers.insert(name, value);
    }

    if !config.api_key.is_empty() {
        let bearer = format!("Bearer {}", config.api_key);
        let value = HeaderValue::from_str(&bearer)
            .map_err(|e| TranslateError::Config(format!("API 密钥无法编码为请求头: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

/// 从响应体中抽取译文并执行长度启发式检查
pub(crate) fn extract_translation(
    response: ChatResponse,
    max_result_chars: usize,
) -> TranslateResult<String> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        TranslateError::ProviderParse("响应中没有 choices 字段或其为空".to_string())
    })?;

    let content = choice.message.content.trim().to_string();
    if content.is_empty() {
        return Err(TranslateError::ProviderParse(
            "响应消息内容为空".to_string(),
        ));
    }

    let length = content.chars().count();
    if length > max_result_chars {
        return Err(TranslateError::ResultTooLong { length });
    }

    Ok(content)
}

#[async_trait]
impl TranslateProvider for ChatCompletionProvider {
    async fn translate(&self, sentence: &str, target_word: &str) -> TranslateResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: self.build_messages(sentence, target_word),
        };

        tracing::debug!(
            "调用外部接口翻译: {} (后端: {}, 模型: {})",
            target_word,
            self.config.name,
            self.config.model
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .headers(self.headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslateError::ProviderTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::ProviderTransport(format!(
                "接口返回状态码 {}",
                status
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::ProviderParse(e.to_string()))?;

        extract_translation(body, self.max_result_chars)
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
