//! 加权选词
//!
//! 基于反向频率权重从候选词中随机选出一个：被选次数越多的词权重越低，
//! 让已被充分覆盖的词逐渐让位给较少出现的词，提升多次请求的复习价值。

use rand::Rng;

use crate::storage::FrequencyLedger;

/// 加权选词器
///
/// 候选词 `w` 的权重为 `1 / (次数 + 1)`：次数为 0 时权重为 1，
/// 次数越高权重越低。归一化后按累积权重做一次均匀抽样，
/// 每个候选的选中概率等于其归一化权重。
#[derive(Debug, Default, Clone)]
pub struct WeightedSelector;

impl WeightedSelector {
    pub fn new() -> Self {
        Self
    }

    /// 从候选词中选出一个
    ///
    /// 候选集为空返回 `None`，由调用方上报"无可翻译词"；
    /// 单个候选直接返回，不消耗随机数，保证单元素输入的确定性。
    pub fn select(&self, candidates: &[String], ledger: &FrequencyLedger) -> Option<String> {
        self.select_with(candidates, ledger, &mut rand::thread_rng())
    }

    /// 使用指定随机源选词（测试可注入确定性随机源）
    pub fn select_with<R: Rng + ?Sized>(
        &self,
        candidates: &[String],
        ledger: &FrequencyLedger,
        rng: &mut R,
    ) -> Option<String> {
        match candidates {
            [] => None,
            [only] => Some(only.clone()),
            _ => {
                let weights: Vec<f64> = candidates
                    .iter()
                    .map(|word| 1.0 / (ledger.get(word) as f64 + 1.0))
                    .collect();
                let total: f64 = weights.iter().sum();

                // 累积归一化权重上做一次均匀抽样
                let roll: f64 = rng.gen();
                let mut cumulative = 0.0;
                for (word, weight) in candidates.iter().zip(&weights) {
                    cumulative += weight / total;
                    if roll <= cumulative {
                        return Some(word.clone());
                    }
                }

                // 浮点累积误差的兜底
                candidates.last().cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Store;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn empty_ledger() -> FrequencyLedger {
        FrequencyLedger::new(Arc::new(Store::in_memory()))
    }

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_candidates_return_none() {
        let selector = WeightedSelector::new();
        assert!(selector.select(&[], &empty_ledger()).is_none());
    }

    #[test]
    fn test_singleton_is_deterministic_without_consuming_entropy() {
        let selector = WeightedSelector::new();
        let ledger = empty_ledger();
        let candidates = words(&["苹果"]);

        let mut rng = StdRng::seed_from_u64(42);
        let picked = selector.select_with(&candidates, &ledger, &mut rng);
        assert_eq!(picked.as_deref(), Some("苹果"));

        // 单元素路径不应消耗随机数
        let mut fresh = StdRng::seed_from_u64(42);
        assert_eq!(rng.gen::<u64>(), fresh.gen::<u64>());
    }

    #[test]
    fn test_selection_always_returns_a_candidate() {
        let selector = WeightedSelector::new();
        let ledger = empty_ledger();
        let candidates = words(&["喜欢", "吃", "苹果"]);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let picked = selector
                .select_with(&candidates, &ledger, &mut rng)
                .expect("非空候选集必有结果");
            assert!(candidates.contains(&picked));
        }
    }

    #[test]
    fn test_inverse_frequency_bias() {
        let selector = WeightedSelector::new();
        let ledger = empty_ledger();

        // 次数 0 的词权重 1，次数 10 的词权重 1/11，理论比约 11:1
        for _ in 0..10 {
            ledger.increment("吃");
        }
        let candidates = words(&["苹果", "吃"]);

        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 5000;
        let mut fresh_word = 0usize;
        for _ in 0..trials {
            if selector
                .select_with(&candidates, &ledger, &mut rng)
                .as_deref()
                == Some("苹果")
            {
                fresh_word += 1;
            }
        }

        let worn_word = trials - fresh_word;
        // 经验频率应显著偏向未被选过的词，留出统计波动余量
        assert!(
            fresh_word > worn_word * 5,
            "反向权重失效: 苹果={} 吃={}",
            fresh_word,
            worn_word
        );
    }

    #[test]
    fn test_uniform_when_ledger_empty() {
        let selector = WeightedSelector::new();
        let ledger = empty_ledger();
        let candidates = words(&["喜欢", "吃", "苹果"]);

        let mut rng = StdRng::seed_from_u64(99);
        let trials = 6000;
        let mut counts = std::collections::HashMap::new();
        for _ in 0..trials {
            let picked = selector
                .select_with(&candidates, &ledger, &mut rng)
                .unwrap();
            *counts.entry(picked).or_insert(0usize) += 1;
        }

        // 空账本下三个候选各约 1/3，允许 ±40% 的波动
        for word in &candidates {
            let share = counts[word] as f64 / trials as f64;
            assert!(
                (0.2..0.47).contains(&share),
                "'{}' 的经验频率偏离均匀分布: {}",
                word,
                share
            );
        }
    }
}
