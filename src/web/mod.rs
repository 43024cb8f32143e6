//! HTTP 服务边界
//!
//! 将翻译服务暴露为 JSON API：选词翻译、配置展示、缓存管理。
//! 错误统一映射为 `{"error": ...}` 响应体与对应的状态码。

pub mod handlers;
pub mod routes;
pub mod types;

pub use routes::create_routes;
pub use types::AppState;
