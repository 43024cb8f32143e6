//! cixuan — 中文选词翻译服务
//!
//! 从中文句子中按词性筛选候选词，以反向频率权重随机选出一个目标词，
//! 通过 chat-completion 风格的外部接口翻译其语境含义，并把结果
//! 持久化缓存。核心流程：
//!
//! 1. 词法标注与词性过滤（[`lexical`]）
//! 2. 反向频率加权选词（[`selector`] + [`storage::FrequencyLedger`]）
//! 3. 翻译缓存查询与回填（[`storage::TranslationCache`]）
//! 4. 配置驱动的外部翻译后端（[`provider`]）
//!
//! [`service::TranslateService`] 编排全流程，[`web`] 将其暴露为 JSON API。

pub mod config;
pub mod error;
pub mod lexical;
pub mod provider;
pub mod selector;
pub mod service;
pub mod storage;
pub mod web;

pub use config::{AppConfig, ProviderConfig};
pub use error::{TranslateError, TranslateResult};
pub use lexical::{CandidateFilter, JiebaFilter, LexicalFilter};
pub use provider::{ChatCompletionProvider, ProviderOverride, TranslateProvider};
pub use selector::WeightedSelector;
pub use service::{TranslateOutcome, TranslateService};
pub use storage::{FrequencyLedger, Store, TranslationCache};
