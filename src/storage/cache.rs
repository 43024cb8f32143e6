//! 翻译缓存
//!
//! 内容寻址的持久化缓存：键由 (句子, 目标词) 的确定性摘要导出，
//! 相同输入跨进程重启映射到同一个键，重复请求不再调用外部模型。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TranslateResult;
use crate::storage::Store;

/// 缓存键的拼接分隔符
///
/// 假定 `|` 不会让不同的 (句子, 词) 组合拼出相同字符串；
/// 极端构造下的歧义与哈希碰撞风险未做处理，属已知局限。
const KEY_SEPARATOR: &str = "|";

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 内容寻址键
    pub key: String,
    /// 上下文句子
    pub sentence: String,
    /// 被翻译的目标词
    pub target_word: String,
    /// 翻译结果
    pub translation: String,
    /// 写入时间（unix 秒）
    pub timestamp: i64,
}

impl CacheEntry {
    /// 构造一个以当前时间为时间戳的缓存条目
    pub fn build(sentence: &str, target_word: &str, translation: &str) -> Self {
        Self {
            key: cache_key(sentence, target_word),
            sentence: sentence.to_string(),
            target_word: target_word.to_string(),
            translation: translation.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// 根据句子和目标词生成缓存键
///
/// 对 `句子|词` 的 UTF-8 字节做 blake3 摘要。纯函数：相同输入
/// 在任何进程、任何时刻都产生相同的键。
pub fn cache_key(sentence: &str, target_word: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(sentence.as_bytes());
    hasher.update(KEY_SEPARATOR.as_bytes());
    hasher.update(target_word.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// 翻译缓存
///
/// 对共享存储中缓存表的轻量视图。查找是无副作用的纯读操作；
/// 写入采用覆盖语义，同一键的并发写入由存储层串行化，后写者胜出。
#[derive(Clone)]
pub struct TranslationCache {
    store: Arc<Store>,
}

impl TranslationCache {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// 查找缓存的翻译结果
    ///
    /// 存储读取失败按未命中处理并记录日志，不中断请求。
    pub fn lookup(&self, sentence: &str, target_word: &str) -> Option<CacheEntry> {
        let key = cache_key(sentence, target_word);
        match self.store.cache_get(&key) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("读取缓存失败，按未命中处理: {}", e);
                None
            }
        }
    }

    /// 写入翻译结果
    ///
    /// 写入失败由调用方决定如何处理；成功的翻译不应因缓存故障而失败。
    pub fn store(
        &self,
        sentence: &str,
        target_word: &str,
        translation: &str,
    ) -> TranslateResult<CacheEntry> {
        let entry = CacheEntry::build(sentence, target_word, translation);
        self.store.cache_put(&entry)?;
        tracing::debug!("翻译结果已缓存: {} -> {}", target_word, translation);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = cache_key("我喜欢吃苹果", "苹果");
        let b = cache_key("我喜欢吃苹果", "苹果");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_distinguishes_sentence_and_word() {
        let base = cache_key("我喜欢吃苹果", "苹果");
        assert_ne!(base, cache_key("我喜欢吃苹果", "喜欢"));
        assert_ne!(base, cache_key("我不喜欢吃苹果", "苹果"));
    }

    #[test]
    fn test_roundtrip() {
        let cache = TranslationCache::new(Arc::new(Store::in_memory()));

        assert!(cache.lookup("我喜欢吃苹果", "喜欢").is_none());

        cache.store("我喜欢吃苹果", "喜欢", "like").unwrap();
        let entry = cache.lookup("我喜欢吃苹果", "喜欢").expect("应当命中");

        assert_eq!(entry.translation, "like");
        assert_eq!(entry.target_word, "喜欢");
        assert_eq!(entry.sentence, "我喜欢吃苹果");
        assert!(entry.timestamp > 0);
    }

    #[test]
    fn test_overwrite_last_write_wins() {
        let cache = TranslationCache::new(Arc::new(Store::in_memory()));

        cache.store("我喜欢吃苹果", "喜欢", "like").unwrap();
        cache.store("我喜欢吃苹果", "喜欢", "enjoy").unwrap();

        let entry = cache.lookup("我喜欢吃苹果", "喜欢").unwrap();
        assert_eq!(entry.translation, "enjoy");
    }

    #[test]
    fn test_unstored_pair_is_absent() {
        let cache = TranslationCache::new(Arc::new(Store::in_memory()));
        cache.store("我喜欢吃苹果", "喜欢", "like").unwrap();
        assert!(cache.lookup("我喜欢吃苹果", "苹果").is_none());
        assert!(cache.lookup("今天天气不错", "喜欢").is_none());
    }
}
