use thiserror::Error;

use crate::orchestrator::session::SessionState;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 会话状态错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// Cookie 存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// LLM 服务错误
///
/// 在编排层中只会成为单题的失败记录，不会中断整批处理，因此不并入 `AppError`
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败（网络 / 鉴权 / 限流）
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求构建失败
    #[error("LLM 请求构建失败: {0}")]
    RequestBuildFailed(String),
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 调用超时
    #[error("LLM 调用超时 ({secs} 秒)")]
    Timeout { secs: u64 },
}

/// 会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 会话状态不允许该操作
    #[error("会话 {id} 未就绪 (当前状态: {state:?})")]
    NotReady { id: String, state: SessionState },
    /// 会话不存在
    #[error("会话不存在: {id}")]
    NotFound { id: String },
    /// 会话 ID 已被占用
    #[error("会话已存在: {id}")]
    AlreadyActive { id: String },
    /// 连接外部浏览器时只允许有限个会话
    #[error("会话数量已达上限 ({limit})")]
    LimitReached { limit: usize },
}

/// Cookie 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 读取失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
///
/// 加载配置时只记录警告并回退到默认值
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    FileParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON处理失败: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建会话未就绪错误
    pub fn not_ready(id: impl Into<String>, state: SessionState) -> Self {
        AppError::Session(SessionError::NotReady {
            id: id.into(),
            state,
        })
    }

    /// 创建会话不存在错误
    pub fn session_not_found(id: impl Into<String>) -> Self {
        AppError::Session(SessionError::NotFound { id: id.into() })
    }

    /// 创建浏览器启动错误
    pub fn browser_launch_failed(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        AppError::Browser(BrowserError::LaunchFailed {
            source: source.into(),
        })
    }

    /// 创建导航失败错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Browser(BrowserError::NavigationFailed {
            url: url.into(),
            source: source.into(),
        })
    }

    /// 创建浏览器连接错误
    pub fn connection_failed(port: u16, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: source.into(),
        })
    }

    /// 是否为会话未就绪错误
    pub fn is_not_ready(&self) -> bool {
        matches!(self, AppError::Session(SessionError::NotReady { .. }))
    }
}

impl LlmError {
    /// 创建LLM API调用错误
    pub fn api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
