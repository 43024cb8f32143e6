//! 存储管理模块
//!
//! 翻译缓存与词频表共用一个嵌入式 redb 数据库（两张表），
//! 写事务按键原子化更新，避免了旧实现"每次变更重写整个文件"的开销。
//! 数据库打开失败时整体降级为进程内存储，保证翻译流程不被持久化问题阻塞，
//! 这是一个有意的取舍，降级路径会记录错误日志。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;

use crate::error::{TranslateError, TranslateResult};

pub mod cache;
pub mod ledger;

pub use cache::{CacheEntry, TranslationCache};
pub use ledger::FrequencyLedger;

/// 翻译缓存表：缓存键 -> JSON 编码的缓存条目
const CACHE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("translation_cache");

/// 词频表：词语 -> 被选择次数
const FREQ_TABLE: TableDefinition<&str, u64> = TableDefinition::new("word_frequency");

/// 数据库文件名
const STORE_FILE: &str = "cixuan.redb";

/// 存储后端
enum StoreBackend {
    /// 嵌入式数据库
    Redb { db: Database, path: PathBuf },
    /// 进程内降级存储
    Memory(MemTables),
}

/// 内存模式的两张表
#[derive(Default)]
struct MemTables {
    freq: RwLock<HashMap<String, u64>>,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

/// 存储状态快照
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub cache_entries: u64,
    pub frequency_entries: u64,
    pub persistent: bool,
    pub path: Option<String>,
}

/// 持久化存储
///
/// 词频表与翻译缓存唯一的共享可变状态。redb 的单写者事务模型
/// 保证了对同一词条的并发写入串行执行，读事务与写事务互不阻塞。
pub struct Store {
    backend: StoreBackend,
}

impl Store {
    /// 在指定数据目录下打开（或创建）数据库
    ///
    /// 两张表在首个写事务中预先创建，之后的读事务不会再遇到表不存在的情况。
    pub fn open(data_dir: &Path) -> TranslateResult<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| TranslateError::Persistence(format!("创建数据目录失败: {}", e)))?;

        let path = data_dir.join(STORE_FILE);
        let db = Database::create(&path)
            .map_err(|e| TranslateError::Persistence(format!("打开数据库失败: {}", e)))?;

        // 预创建两张表
        let init = || -> Result<(), redb::Error> {
            let txn = db.begin_write()?;
            txn.open_table(CACHE_TABLE)?;
            txn.open_table(FREQ_TABLE)?;
            txn.commit()?;
            Ok(())
        };
        init()?;

        tracing::info!("已打开数据库: {}", path.display());
        Ok(Self {
            backend: StoreBackend::Redb { db, path },
        })
    }

    /// 创建纯内存存储（测试或降级模式）
    pub fn in_memory() -> Self {
        Self {
            backend: StoreBackend::Memory(MemTables::default()),
        }
    }

    /// 打开数据库，失败时降级为内存模式
    ///
    /// 降级后缓存与词频仅在进程生命周期内有效，重启即丢失。
    pub fn open_or_memory(data_dir: &Path) -> Self {
        match Self::open(data_dir) {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("打开数据库失败，降级为内存存储（重启后数据丢失）: {}", e);
                Self::in_memory()
            }
        }
    }

    /// 是否为持久化后端
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StoreBackend::Redb { .. })
    }

    /// 获取词语的选择次数，未出现过的词返回 0
    pub fn freq_get(&self, word: &str) -> TranslateResult<u64> {
        match &self.backend {
            StoreBackend::Redb { db, .. } => {
                let read = || -> Result<u64, redb::Error> {
                    let txn = db.begin_read()?;
                    let table = txn.open_table(FREQ_TABLE)?;
                    Ok(table.get(word)?.map(|v| v.value()).unwrap_or(0))
                };
                Ok(read()?)
            }
            StoreBackend::Memory(mem) => {
                let freq = mem
                    .freq
                    .read()
                    .map_err(|_| TranslateError::Persistence("词频表锁中毒".to_string()))?;
                Ok(freq.get(word).copied().unwrap_or(0))
            }
        }
    }

    /// 将词语的选择次数加一，返回新值
    ///
    /// 读-改-写在单个写事务内完成，redb 的单写者模型保证同一词条的
    /// 并发自增不会丢失更新。
    pub fn freq_increment(&self, word: &str) -> TranslateResult<u64> {
        match &self.backend {
            StoreBackend::Redb { db, .. } => {
                let write = || -> Result<u64, redb::Error> {
                    let txn = db.begin_write()?;
                    let updated;
                    {
                        let mut table = txn.open_table(FREQ_TABLE)?;
                        let current = table.get(word)?.map(|v| v.value()).unwrap_or(0);
                        updated = current + 1;
                        table.insert(word, updated)?;
                    }
                    txn.commit()?;
                    Ok(updated)
                };
                Ok(write()?)
            }
            StoreBackend::Memory(mem) => {
                let mut freq = mem
                    .freq
                    .write()
                    .map_err(|_| TranslateError::Persistence("词频表锁中毒".to_string()))?;
                let count = freq.entry(word.to_string()).or_insert(0);
                *count += 1;
                Ok(*count)
            }
        }
    }

    /// 按缓存键读取缓存条目
    pub fn cache_get(&self, key: &str) -> TranslateResult<Option<CacheEntry>> {
        match &self.backend {
            StoreBackend::Redb { db, .. } => {
                let read = || -> Result<Option<Vec<u8>>, redb::Error> {
                    let txn = db.begin_read()?;
                    let table = txn.open_table(CACHE_TABLE)?;
                    Ok(table.get(key)?.map(|v| v.value().to_vec()))
                };
                match read()? {
                    Some(payload) => {
                        let entry: CacheEntry = serde_json::from_slice(&payload)?;
                        Ok(Some(entry))
                    }
                    None => Ok(None),
                }
            }
            StoreBackend::Memory(mem) => {
                let cache = mem
                    .cache
                    .read()
                    .map_err(|_| TranslateError::Persistence("缓存表锁中毒".to_string()))?;
                Ok(cache.get(key).cloned())
            }
        }
    }

    /// 写入缓存条目（覆盖语义，后写者胜出）
    pub fn cache_put(&self, entry: &CacheEntry) -> TranslateResult<()> {
        match &self.backend {
            StoreBackend::Redb { db, .. } => {
                let payload = serde_json::to_vec(entry)?;
                let write = || -> Result<(), redb::Error> {
                    let txn = db.begin_write()?;
                    {
                        let mut table = txn.open_table(CACHE_TABLE)?;
                        table.insert(entry.key.as_str(), payload.as_slice())?;
                    }
                    txn.commit()?;
                    Ok(())
                };
                Ok(write()?)
            }
            StoreBackend::Memory(mem) => {
                let mut cache = mem
                    .cache
                    .write()
                    .map_err(|_| TranslateError::Persistence("缓存表锁中毒".to_string()))?;
                cache.insert(entry.key.clone(), entry.clone());
                Ok(())
            }
        }
    }

    /// 清空翻译缓存与词频表（联合管理性重置）
    ///
    /// 两张表在同一个写事务中清空，重置是原子的。
    pub fn clear_all(&self) -> TranslateResult<()> {
        match &self.backend {
            StoreBackend::Redb { db, .. } => {
                let clear = || -> Result<(), redb::Error> {
                    let txn = db.begin_write()?;
                    txn.delete_table(CACHE_TABLE)?;
                    txn.delete_table(FREQ_TABLE)?;
                    // 立即重建空表，保持后续读事务可用
                    txn.open_table(CACHE_TABLE)?;
                    txn.open_table(FREQ_TABLE)?;
                    txn.commit()?;
                    Ok(())
                };
                clear()?;
            }
            StoreBackend::Memory(mem) => {
                let mut cache = mem
                    .cache
                    .write()
                    .map_err(|_| TranslateError::Persistence("缓存表锁中毒".to_string()))?;
                let mut freq = mem
                    .freq
                    .write()
                    .map_err(|_| TranslateError::Persistence("词频表锁中毒".to_string()))?;
                cache.clear();
                freq.clear();
            }
        }

        tracing::info!("翻译缓存与词频数据已清空");
        Ok(())
    }

    /// 获取存储状态
    pub fn status(&self) -> TranslateResult<StoreStatus> {
        match &self.backend {
            StoreBackend::Redb { db, path } => {
                let read = || -> Result<(u64, u64), redb::Error> {
                    let txn = db.begin_read()?;
                    let cache_entries = txn.open_table(CACHE_TABLE)?.len()?;
                    let frequency_entries = txn.open_table(FREQ_TABLE)?.len()?;
                    Ok((cache_entries, frequency_entries))
                };
                let (cache_entries, frequency_entries) = read()?;
                Ok(StoreStatus {
                    cache_entries,
                    frequency_entries,
                    persistent: true,
                    path: Some(path.display().to_string()),
                })
            }
            StoreBackend::Memory(mem) => {
                let cache = mem
                    .cache
                    .read()
                    .map_err(|_| TranslateError::Persistence("缓存表锁中毒".to_string()))?;
                let freq = mem
                    .freq
                    .read()
                    .map_err(|_| TranslateError::Persistence("词频表锁中毒".to_string()))?;
                Ok(StoreStatus {
                    cache_entries: cache.len() as u64,
                    frequency_entries: freq.len() as u64,
                    persistent: false,
                    path: None,
                })
            }
        }
    }
}
