//! 统一错误处理
//!
//! 定义选词翻译流程中可能出现的各种错误类型及其传播策略。

use thiserror::Error;

/// 翻译服务错误类型
///
/// 每个变体对应一类独立的失败条件，边界层据此决定 HTTP 状态码：
/// 输入类错误不触碰缓存与词频表，提供方错误中止当次请求且不做内部重试，
/// 持久化错误按"尽力而为"降级处理。
#[derive(Error, Debug, Clone)]
pub enum TranslateError {
    /// 输入验证错误（句子为空或缺失）
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 词法过滤后没有可翻译的候选词
    #[error("句子中未找到可翻译的词语")]
    NoCandidateWords,

    /// 调用外部翻译接口失败（网络、超时或非 2xx 响应）
    #[error("调用外部翻译接口失败: {0}")]
    ProviderTransport(String),

    /// 外部接口响应缺少字段或结构不符合预期
    #[error("解析外部接口响应失败: {0}")]
    ProviderParse(String),

    /// 翻译结果超出长度阈值，疑似模型附带了多余说明
    #[error("翻译结果过长（{length} 字符），可能不准确，请尝试其他句子")]
    ResultTooLong { length: usize },

    /// 持久化存储不可用
    #[error("存储错误: {0}")]
    Persistence(String),

    /// 配置加载或验证错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl TranslateError {
    /// 检查错误是否可由外层策略重试
    ///
    /// 核心自身从不重试，该标记仅供调用方参考。
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::ProviderTransport(_) => true,
            TranslateError::Persistence(_) => true,
            TranslateError::InvalidInput(_) => false,
            TranslateError::NoCandidateWords => false,
            TranslateError::ProviderParse(_) => false,
            TranslateError::ResultTooLong { .. } => false,
            TranslateError::Config(_) => false,
        }
    }
}

impl From<redb::Error> for TranslateError {
    fn from(error: redb::Error) -> Self {
        TranslateError::Persistence(error.to_string())
    }
}

impl From<serde_json::Error> for TranslateError {
    fn from(error: serde_json::Error) -> Self {
        TranslateError::Persistence(format!("缓存条目编码失败: {}", error))
    }
}

impl From<toml::de::Error> for TranslateError {
    fn from(error: toml::de::Error) -> Self {
        TranslateError::Config(format!("解析 TOML 配置失败: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslateResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TranslateError::ProviderTransport("连接被拒绝".into()).is_retryable());
        assert!(!TranslateError::NoCandidateWords.is_retryable());
        assert!(!TranslateError::ResultTooLong { length: 45 }.is_retryable());
        assert!(!TranslateError::InvalidInput("空句子".into()).is_retryable());
    }

    #[test]
    fn test_display_contains_context() {
        let err = TranslateError::ResultTooLong { length: 45 };
        assert!(err.to_string().contains("45"));
    }
}
