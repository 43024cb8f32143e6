//! 词法过滤模块
//!
//! 将原始文本切分为带词性标注的词序列，并按词性允许集筛选出可翻译的候选词。
//! 词性标注本身是外部协作者，核心只依赖 [`LexicalFilter`] 接口；
//! 默认实现基于 jieba 分词（对应原始服务使用的 jieba.posseg）。

use jieba_rs::Jieba;

/// 带词性标注的词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedWord {
    pub word: String,
    /// 词性标记，如 `n`（名词）、`v`（动词）、`nr`（人名）
    pub tag: String,
}

impl TaggedWord {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }
}

/// 词法过滤接口
///
/// 把一段文本标注为 (词, 词性) 序列。实现方决定分词粒度与标注体系，
/// 核心只约定名词/动词类标记采用 jieba 风格的前缀约定。
pub trait LexicalFilter: Send + Sync {
    fn tag(&self, text: &str) -> Vec<TaggedWord>;
}

/// 基于 jieba 分词的默认词法过滤器
pub struct JiebaFilter {
    jieba: Jieba,
}

impl JiebaFilter {
    /// 创建过滤器，加载内置词典
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }
}

impl Default for JiebaFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalFilter for JiebaFilter {
    fn tag(&self, text: &str) -> Vec<TaggedWord> {
        self.jieba
            .tag(text, true)
            .into_iter()
            .map(|t| TaggedWord::new(t.word, t.tag))
            .collect()
    }
}

/// 候选词筛选器
///
/// 按配置的词性允许集从标注序列中提取候选词：名词与动词按前缀匹配，
/// 形容词、人名、作品名、地名按精确标记匹配。候选集去重并保持首次出现顺序。
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    /// 前缀匹配的词性（`n` 覆盖 n/nr/ns/nt/nz 等名词子类）
    tag_prefixes: Vec<String>,
    /// 精确匹配的词性
    exact_tags: Vec<String>,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            tag_prefixes: vec!["n".to_string(), "v".to_string()],
            exact_tags: vec![
                "a".to_string(),   // 形容词
                "nr".to_string(),  // 人名
                "nw".to_string(),  // 作品名
                "LOC".to_string(), // 地名
            ],
        }
    }
}

impl CandidateFilter {
    /// 判断词性是否在允许集内
    pub fn allows(&self, tag: &str) -> bool {
        self.tag_prefixes.iter().any(|p| tag.starts_with(p.as_str()))
            || self.exact_tags.iter().any(|t| t == tag)
    }

    /// 从标注序列中提取候选词
    ///
    /// 返回去重后的有序候选集；空白词条被丢弃。
    pub fn candidates(&self, tagged: &[TaggedWord]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut result = Vec::new();

        for item in tagged {
            let word = item.word.trim();
            if word.is_empty() || !self.allows(&item.tag) {
                continue;
            }
            if seen.insert(word.to_string()) {
                result.push(word.to_string());
            }
        }

        result
    }
}
