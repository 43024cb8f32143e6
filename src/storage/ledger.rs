//! 词频账本
//!
//! 记录每个词被选中的累计次数，为加权选词提供反向权重的依据。
//! 次数只增不减，仅联合重置操作可以清空。词频与缓存相互独立：
//! 一个词是否命中缓存不影响其频率统计，频率反映的是"被选中"而非"被新翻译"。

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::storage::Store;

/// 词频账本
///
/// 自增先持久化再返回。持久化失败不会中断调用方：
/// 失败的增量落入进程内兜底计数，`get` 返回持久值与兜底值之和，
/// 计数对本进程仍然单调。这是文档化的取舍——翻译流程不因
/// 账本的持久性问题而阻塞。
#[derive(Clone)]
pub struct FrequencyLedger {
    store: Arc<Store>,
    /// 持久化失败时的进程内兜底计数
    overlay: Arc<RwLock<HashMap<String, u64>>>,
}

impl FrequencyLedger {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            overlay: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 获取词语被选择的次数，未出现过的词返回 0
    pub fn get(&self, word: &str) -> u64 {
        let persisted = match self.store.freq_get(word) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("读取词频失败，按 0 处理: {}", e);
                0
            }
        };

        let overlay = self
            .overlay
            .read()
            .map(|m| m.get(word).copied().unwrap_or(0))
            .unwrap_or(0);

        persisted + overlay
    }

    /// 将词语的选择次数加一，返回新的总次数
    ///
    /// 同一词条的并发自增由存储层的单写者事务（或兜底表的写锁）串行化，
    /// 不会丢失更新。
    pub fn increment(&self, word: &str) -> u64 {
        match self.store.freq_increment(word) {
            Ok(count) => {
                let overlay = self
                    .overlay
                    .read()
                    .map(|m| m.get(word).copied().unwrap_or(0))
                    .unwrap_or(0);
                let total = count + overlay;
                tracing::debug!("词语 '{}' 选择次数更新为: {}", word, total);
                total
            }
            Err(e) => {
                tracing::warn!("持久化词频失败，记入进程内兜底计数: {}", e);
                let unpersisted = match self.overlay.write() {
                    Ok(mut m) => {
                        let count = m.entry(word.to_string()).or_insert(0);
                        *count += 1;
                        *count
                    }
                    Err(_) => 1,
                };
                let persisted = self.store.freq_get(word).unwrap_or(0);
                persisted + unpersisted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_word_is_zero() {
        let ledger = FrequencyLedger::new(Arc::new(Store::in_memory()));
        assert_eq!(ledger.get("苹果"), 0);
    }

    #[test]
    fn test_increment_is_monotonic() {
        let ledger = FrequencyLedger::new(Arc::new(Store::in_memory()));

        for expected in 1..=5 {
            assert_eq!(ledger.increment("苹果"), expected);
        }
        assert_eq!(ledger.get("苹果"), 5);

        // 与其他词的自增交错不影响计数
        ledger.increment("喜欢");
        assert_eq!(ledger.get("苹果"), 5);
        assert_eq!(ledger.get("喜欢"), 1);
    }

    #[test]
    fn test_concurrent_increments_lose_no_updates() {
        let ledger = FrequencyLedger::new(Arc::new(Store::in_memory()));

        // 初始计数 3
        for _ in 0..3 {
            ledger.increment("苹果");
        }

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || ledger.increment("苹果"))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.get("苹果"), 5);
    }
}
