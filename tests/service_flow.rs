//! 翻译服务端到端流程测试
//!
//! 用脚本化词法过滤器与记录调用次数的模拟后端驱动完整流程，
//! 覆盖选词、词频统计、缓存命中与失败路径的交互。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cixuan::error::{TranslateError, TranslateResult};
use cixuan::lexical::{LexicalFilter, TaggedWord};
use cixuan::provider::TranslateProvider;
use cixuan::service::TranslateService;
use cixuan::storage::Store;

/// 返回固定标注序列的词法过滤器
struct ScriptedFilter {
    tagged: Vec<TaggedWord>,
}

impl ScriptedFilter {
    fn new(words: &[(&str, &str)]) -> Self {
        Self {
            tagged: words.iter().map(|(w, t)| TaggedWord::new(*w, *t)).collect(),
        }
    }
}

impl LexicalFilter for ScriptedFilter {
    fn tag(&self, _text: &str) -> Vec<TaggedWord> {
        self.tagged.clone()
    }
}

/// 译文固定、调用计数的模拟后端
struct CountingProvider {
    result: Result<String, TranslateError>,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(error: TranslateError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslateProvider for CountingProvider {
    async fn translate(&self, _sentence: &str, _word: &str) -> TranslateResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }

    fn name(&self) -> &str {
        "counting"
    }
}

fn build_service(
    words: &[(&str, &str)],
    provider: Arc<CountingProvider>,
) -> TranslateService {
    TranslateService::new(
        Arc::new(Store::in_memory()),
        Arc::new(ScriptedFilter::new(words)),
        provider,
    )
}

#[tokio::test]
async fn test_all_candidates_reachable_from_empty_ledger() {
    let provider = CountingProvider::ok("word");
    let service = build_service(
        &[("喜欢", "v"), ("吃", "v"), ("苹果", "n")],
        provider.clone(),
    );

    let mut seen = std::collections::HashSet::new();
    for _ in 0..300 {
        let outcome = service.translate("我喜欢吃苹果").await.unwrap();
        seen.insert(outcome.target_word);
    }

    // 空账本下三个候选权重相等，300 次内每个都应出现过
    for word in ["喜欢", "吃", "苹果"] {
        assert!(seen.contains(word), "'{}' 从未被选中", word);
    }
}

#[tokio::test]
async fn test_repeated_request_hits_cache() {
    let provider = CountingProvider::ok("like");
    let service = build_service(&[("喜欢", "v")], provider.clone());

    let first = service.translate("我喜欢吃苹果").await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.word_frequency, 1);

    let second = service.translate("我喜欢吃苹果").await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.translation, first.translation);
    // 缓存命中依然计入词频
    assert_eq!(second.word_frequency, 2);
    // 外部接口只被调用过一次
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_failed_translation_not_cached() {
    let store = Arc::new(Store::in_memory());
    let failing = CountingProvider::failing(TranslateError::ResultTooLong { length: 45 });
    let service = TranslateService::new(
        store,
        Arc::new(ScriptedFilter::new(&[("喜欢", "v")])),
        failing.clone(),
    );

    let result = service.translate("我喜欢吃苹果").await;
    assert!(matches!(
        result,
        Err(TranslateError::ResultTooLong { length: 45 })
    ));

    // 失败不落缓存：换用正常后端重新请求会真正调用外部接口
    let healthy = CountingProvider::ok("like");
    let outcome = service
        .translate_with("我喜欢吃苹果", healthy.as_ref())
        .await
        .unwrap();
    assert!(!outcome.from_cache);
    assert_eq!(outcome.translation, "like");
    assert_eq!(healthy.call_count(), 1);
}

#[tokio::test]
async fn test_concurrent_requests_lose_no_frequency_updates() {
    let provider = CountingProvider::ok("like");
    let service = Arc::new(build_service(&[("喜欢", "v")], provider.clone()));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.translate("我喜欢吃苹果").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 每个请求恰好计一次词频；并发未命中可能重复调用后端，但至少一次
    let outcome = service.translate("我喜欢吃苹果").await.unwrap();
    assert_eq!(outcome.word_frequency, 11);
    assert!(outcome.from_cache);
    assert!(provider.call_count() >= 1);
}

#[tokio::test]
async fn test_clear_resets_selection_history() {
    let provider = CountingProvider::ok("like");
    let service = build_service(&[("喜欢", "v")], provider.clone());

    for _ in 0..3 {
        service.translate("我喜欢吃苹果").await.unwrap();
    }
    service.clear_data().unwrap();

    let outcome = service.translate("我喜欢吃苹果").await.unwrap();
    // 缓存与词频一起被清空，计数从头开始且缓存未命中
    assert_eq!(outcome.word_frequency, 1);
    assert!(!outcome.from_cache);
}
