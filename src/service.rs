//! 翻译服务编排
//!
//! 按请求组合各组件：验证输入 → 词法过滤 → 加权选词 → 计入词频 →
//! 查缓存 →（未命中时）调用后端并写缓存。词频在选词后无条件自增，
//! 与缓存命中与否无关——频率反映"词被选中"，不是"词被新翻译"。

use std::sync::Arc;

use crate::error::{TranslateError, TranslateResult};
use crate::lexical::{CandidateFilter, LexicalFilter};
use crate::provider::TranslateProvider;
use crate::selector::WeightedSelector;
use crate::storage::{FrequencyLedger, Store, StoreStatus, TranslationCache};

/// 单次翻译请求的结果
#[derive(Debug, Clone)]
pub struct TranslateOutcome {
    pub target_word: String,
    pub translation: String,
    pub from_cache: bool,
    pub word_frequency: u64,
}

/// 翻译服务
///
/// 无共享可变状态（缓存与词频表的并发控制在存储层内部），
/// 可被并发请求安全共享。后端调用是唯一的挂起点，由后端客户端
/// 的超时约束；放弃请求时挂起的网络调用随之取消，不会留下部分写入。
pub struct TranslateService {
    filter: Arc<dyn LexicalFilter>,
    candidate_filter: CandidateFilter,
    selector: WeightedSelector,
    ledger: FrequencyLedger,
    cache: TranslationCache,
    provider: Arc<dyn TranslateProvider>,
    store: Arc<Store>,
}

impl TranslateService {
    pub fn new(
        store: Arc<Store>,
        filter: Arc<dyn LexicalFilter>,
        provider: Arc<dyn TranslateProvider>,
    ) -> Self {
        Self {
            filter,
            candidate_filter: CandidateFilter::default(),
            selector: WeightedSelector::new(),
            ledger: FrequencyLedger::new(store.clone()),
            cache: TranslationCache::new(store.clone()),
            provider,
            store,
        }
    }

    /// 使用进程默认后端翻译
    pub async fn translate(&self, sentence: &str) -> TranslateResult<TranslateOutcome> {
        let provider = self.provider.clone();
        self.translate_with(sentence, provider.as_ref()).await
    }

    /// 使用指定后端翻译（支持按请求覆盖后端配置）
    pub async fn translate_with(
        &self,
        sentence: &str,
        provider: &dyn TranslateProvider,
    ) -> TranslateResult<TranslateOutcome> {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Err(TranslateError::InvalidInput(
                "请提供非空的 sentence 字段".to_string(),
            ));
        }

        // 词法过滤产出候选集；输入类错误不触碰缓存与词频表
        let tagged = self.filter.tag(sentence);
        let candidates = self.candidate_filter.candidates(&tagged);

        let target_word = self
            .selector
            .select(&candidates, &self.ledger)
            .ok_or(TranslateError::NoCandidateWords)?;

        // 无论随后是否命中缓存，选择本身都计入词频
        let word_frequency = self.ledger.increment(&target_word);

        if let Some(entry) = self.cache.lookup(sentence, &target_word) {
            tracing::debug!("从缓存中获取翻译: {} -> {}", target_word, entry.translation);
            return Ok(TranslateOutcome {
                target_word,
                translation: entry.translation,
                from_cache: true,
                word_frequency,
            });
        }

        let translation = provider.translate(sentence, &target_word).await?;

        // 缓存故障不拖垮成功的翻译响应
        if let Err(e) = self.cache.store(sentence, &target_word, &translation) {
            tracing::warn!("写入缓存失败，翻译结果仍正常返回: {}", e);
        }

        Ok(TranslateOutcome {
            target_word,
            translation,
            from_cache: false,
            word_frequency,
        })
    }

    /// 联合重置：清空翻译缓存与词频数据
    pub fn clear_data(&self) -> TranslateResult<()> {
        self.store.clear_all()
    }

    /// 存储状态快照
    pub fn store_status(&self) -> TranslateResult<StoreStatus> {
        self.store.status()
    }
}
