//! 配置管理模块
//!
//! 提供统一的配置接口，支持 TOML 配置文件、`.env` 文件和环境变量覆盖。
//! 配置中的 `${VAR}` 占位符在加载时一次性解析并冻结，之后不再变化，
//! 任何翻译后端客户端都只会看到解析完成的最终值。

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TranslateError, TranslateResult};

/// 配置常量
pub mod constants {
    /// 默认的外部翻译接口地址
    pub const DEFAULT_API_URL: &str = "http://localhost:8080/v1/chat/completions";

    /// 默认模型名称
    pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

    /// 默认系统提示词
    pub const DEFAULT_SYSTEM_PROMPT: &str =
        "你是一个英语翻译专家，精通于根据中文上下文去翻译词汇的意思。";

    /// 默认用户提示词模板
    pub const DEFAULT_USER_PROMPT_TEMPLATE: &str =
        "翻译下面句子中的「{target_word}」：{context_sentence}";

    /// 目标词占位符
    pub const PLACEHOLDER_TARGET_WORD: &str = "{target_word}";

    /// 上下文句子占位符
    pub const PLACEHOLDER_CONTEXT_SENTENCE: &str = "{context_sentence}";

    /// 翻译结果长度阈值（字符数），超过则视为不可靠结果
    pub const DEFAULT_MAX_RESULT_CHARS: usize = 30;

    /// 外部接口调用超时（秒）
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    /// 默认监听地址
    pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";

    /// 默认数据目录
    pub const DEFAULT_DATA_DIR: &str = "data";

    /// 配置文件查找路径（按顺序）
    pub const CONFIG_PATHS: &[&str] = &[
        "cixuan.toml",
        "config/cixuan.toml",
        "~/.config/cixuan/config.toml",
    ];
}

/// 翻译后端配置
///
/// 描述一个 chat-completion 风格的翻译后端。构造完成后不可变，
/// 进程生命周期内选定一个激活档案，边界层可按请求合并覆盖值。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// 档案名称，加载时由 `[providers.<name>]` 的键回填
    #[serde(skip)]
    pub name: String,

    /// 接口地址
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// API 密钥，空字符串表示该后端无需鉴权
    #[serde(default)]
    pub api_key: String,

    /// 后端是否接受 system 角色消息
    ///
    /// 为 false 时系统指令会并入用户消息，兼容拒绝 system 角色的后端
    #[serde(default = "default_true")]
    pub use_system_role: bool,

    /// 系统提示词
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// 用户提示词模板，须包含 `{target_word}` 与 `{context_sentence}` 占位符
    #[serde(default = "default_user_prompt_template")]
    pub user_prompt_template: String,

    /// 网络代理地址（如 `socks5://127.0.0.1:1080`）
    #[serde(default)]
    pub proxy: Option<String>,

    /// 后端专属的自定义请求头
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_api_url() -> String {
    constants::DEFAULT_API_URL.to_string()
}

fn default_model() -> String {
    constants::DEFAULT_MODEL.to_string()
}

fn default_system_prompt() -> String {
    constants::DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_user_prompt_template() -> String {
    constants::DEFAULT_USER_PROMPT_TEMPLATE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            api_url: default_api_url(),
            model: default_model(),
            api_key: String::new(),
            use_system_role: true,
            system_prompt: default_system_prompt(),
            user_prompt_template: default_user_prompt_template(),
            proxy: None,
            headers: HashMap::new(),
        }
    }
}

impl ProviderConfig {
    /// 解析配置值中的环境变量占位符
    ///
    /// `api_key`、代理地址和自定义请求头的值支持 `${VAR}` 形式，
    /// 在加载时一次性展开。引用了未定义变量视为配置错误而不是留到调用时。
    fn resolve_placeholders(&mut self) -> TranslateResult<()> {
        self.api_key = expand_env(&self.api_key, "api_key")?;

        if let Some(proxy) = &self.proxy {
            self.proxy = Some(expand_env(proxy, "proxy")?);
        }

        let mut resolved = HashMap::with_capacity(self.headers.len());
        for (key, value) in &self.headers {
            resolved.insert(key.clone(), expand_env(value, key)?);
        }
        self.headers = resolved;

        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> TranslateResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(TranslateError::Config(format!(
                "档案 '{}' 的 api_url 不能为空",
                self.name
            )));
        }

        if self.model.trim().is_empty() {
            return Err(TranslateError::Config(format!(
                "档案 '{}' 的 model 不能为空",
                self.name
            )));
        }

        for placeholder in [
            constants::PLACEHOLDER_TARGET_WORD,
            constants::PLACEHOLDER_CONTEXT_SENTENCE,
        ] {
            if !self.user_prompt_template.contains(placeholder) {
                return Err(TranslateError::Config(format!(
                    "档案 '{}' 的用户提示词模板缺少 {} 占位符",
                    self.name, placeholder
                )));
            }
        }

        Ok(())
    }

    /// 构造用户提示词
    pub fn render_user_prompt(&self, sentence: &str, target_word: &str) -> String {
        self.user_prompt_template
            .replace(constants::PLACEHOLDER_TARGET_WORD, target_word)
            .replace(constants::PLACEHOLDER_CONTEXT_SENTENCE, sentence)
    }

    /// 返回掩码后的 API 密钥，仅保留前 4 位用于展示
    pub fn masked_api_key(&self) -> String {
        if self.api_key.is_empty() {
            return String::new();
        }
        let visible: String = self.api_key.chars().take(4).collect();
        let hidden = self.api_key.chars().count().saturating_sub(4);
        format!("{}{}", visible, "*".repeat(hidden))
    }
}

/// 展开单个配置值中的环境变量占位符
fn expand_env(value: &str, field: &str) -> TranslateResult<String> {
    shellexpand::env(value)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| {
            TranslateError::Config(format!("解析 {} 中的环境变量失败: {}", field, e))
        })
}

/// 应用配置
///
/// 服务进程的完整配置：监听地址、数据目录、调用约束与具名的后端档案集合。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// HTTP 监听地址
    #[serde(default = "default_listen")]
    pub listen: String,

    /// 持久化数据目录
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// 外部接口调用超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// 翻译结果长度阈值（字符数）
    #[serde(default = "default_max_result_chars")]
    pub max_result_chars: usize,

    /// 激活的后端档案名称
    #[serde(default = "default_active_provider")]
    pub active_provider: String,

    /// 具名后端档案
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_listen() -> String {
    constants::DEFAULT_LISTEN.to_string()
}

fn default_data_dir() -> String {
    constants::DEFAULT_DATA_DIR.to_string()
}

fn default_timeout_secs() -> u64 {
    constants::DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_result_chars() -> usize {
    constants::DEFAULT_MAX_RESULT_CHARS
}

fn default_active_provider() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert("default".to_string(), ProviderConfig::default());

        Self {
            listen: default_listen(),
            data_dir: default_data_dir(),
            request_timeout_secs: default_timeout_secs(),
            max_result_chars: default_max_result_chars(),
            active_provider: default_active_provider(),
            providers,
        }
    }
}

impl AppConfig {
    /// 加载配置
    ///
    /// 依次尝试 `.env` 文件、固定路径下的配置文件和环境变量覆盖，
    /// 最后解析占位符并验证。没有找到配置文件时使用默认配置。
    pub fn load() -> TranslateResult<Self> {
        load_dotenv();

        let mut config = Self::load_from_paths()?;
        config.apply_env_overrides();
        config.finalize()?;

        Ok(config)
    }

    /// 在固定路径中查找并解析配置文件
    fn load_from_paths() -> TranslateResult<Self> {
        for path in constants::CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded);
                return Self::load_from_file(expanded.as_ref());
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(Self::default())
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &str) -> TranslateResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslateError::Config(format!("读取配置文件失败: {}", e)))?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// 应用环境变量覆盖
    ///
    /// `CIXUAN_API_URL`、`CIXUAN_API_KEY`、`CIXUAN_MODEL` 覆盖激活档案的
    /// 对应字段，`CIXUAN_LISTEN` 与 `CIXUAN_DATA_DIR` 覆盖进程级配置。
    fn apply_env_overrides(&mut self) {
        if let Ok(listen) = std::env::var("CIXUAN_LISTEN") {
            self.listen = listen;
        }
        if let Ok(data_dir) = std::env::var("CIXUAN_DATA_DIR") {
            self.data_dir = data_dir;
        }

        let active = self.active_provider.clone();
        if let Some(provider) = self.providers.get_mut(&active) {
            if let Ok(api_url) = std::env::var("CIXUAN_API_URL") {
                tracing::info!("环境变量覆盖 API URL: {}", api_url);
                provider.api_url = api_url;
            }
            if let Ok(api_key) = std::env::var("CIXUAN_API_KEY") {
                provider.api_key = api_key;
            }
            if let Ok(model) = std::env::var("CIXUAN_MODEL") {
                provider.model = model;
            }
        }
    }

    /// 回填档案名称、解析占位符并验证整体配置
    ///
    /// 解析完成后配置即冻结，不再读取环境变量。
    fn finalize(&mut self) -> TranslateResult<()> {
        if self.providers.is_empty() {
            self.providers
                .insert("default".to_string(), ProviderConfig::default());
        }

        for (name, provider) in self.providers.iter_mut() {
            provider.name = name.clone();
            provider.resolve_placeholders()?;
            provider.validate()?;
        }

        if !self.providers.contains_key(&self.active_provider) {
            return Err(TranslateError::Config(format!(
                "激活档案 '{}' 不存在，可用档案: {:?}",
                self.active_provider,
                self.providers.keys().collect::<Vec<_>>()
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslateError::Config(
                "外部接口调用超时不能为 0".to_string(),
            ));
        }

        if self.max_result_chars == 0 {
            return Err(TranslateError::Config(
                "翻译结果长度阈值不能为 0".to_string(),
            ));
        }

        Ok(())
    }

    /// 获取激活的后端档案
    pub fn active_provider(&self) -> &ProviderConfig {
        // finalize 保证了激活档案存在
        &self.providers[&self.active_provider]
    }

    /// 外部接口调用超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslateResult<()> {
        let config = AppConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslateError::Config(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslateError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

/// 加载 .env 文件
fn load_dotenv() {
    let env_files = [".env.local", ".env"];

    for env_file in &env_files {
        if Path::new(env_file).exists() {
            if dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }
}
