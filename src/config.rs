use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

/// 程序配置文件
///
/// 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 测验页面 URL
    pub target_url: String,
    /// 是否以无头模式启动浏览器（默认有界面，方便远程查看）
    pub headless: bool,
    /// 浏览器窗口尺寸，格式 "宽x高"
    pub window_size: String,
    /// 自定义浏览器可执行文件路径
    pub chrome_executable: Option<String>,
    /// 连接已运行浏览器的调试端口（设置后不再启动新浏览器）
    ///
    /// 所有会话会共用该浏览器的 Cookie，因此这种模式下同时只允许一个会话
    pub browser_debug_port: Option<u16>,
    /// Cookie 存放目录
    pub cookies_dir: String,
    /// 页面导航 / 全局操作超时（秒）
    pub timeout_secs: u64,
    /// 等待题目出现的超时（秒）
    pub page_wait_timeout_secs: u64,
    /// 单次 LLM 调用超时（秒）
    pub completion_timeout_secs: u64,
    /// 题目之间的间隔（毫秒）
    pub question_delay_ms: u64,
    /// 答完后是否自动提交
    pub auto_submit: bool,
    /// 只提取题目不作答
    pub dry_run: bool,
    /// 从保存的 Cookie 恢复会话
    pub restore_session_id: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "about:blank".to_string(),
            headless: false,
            window_size: "1920x1080".to_string(),
            chrome_executable: None,
            browser_debug_port: None,
            cookies_dir: "cookies".to_string(),
            timeout_secs: 60,
            page_wait_timeout_secs: 10,
            completion_timeout_secs: 60,
            question_delay_ms: 500,
            auto_submit: false,
            dry_run: false,
            restore_session_id: None,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.groq.com/openai/v1".to_string(),
            llm_model_name: "llama-3.3-70b-versatile".to_string(),
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，再应用环境变量覆盖
    ///
    /// 文件不存在时使用默认值；文件格式错误时记录警告并使用默认值
    pub fn load(path: impl AsRef<Path>) -> Self {
        let base = match Self::from_file(path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("{}，使用默认配置", e);
                Self::default()
            }
        };
        base.with_env_overrides()
    }

    /// 只读取 TOML 文件，文件不存在时返回 `None`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        let Ok(content) = std::fs::read_to_string(path) else {
            return Ok(None);
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| ConfigError::FileParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
    }

    /// 仅从环境变量加载配置
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            target_url: std::env::var("TARGET_URL").unwrap_or(base.target_url),
            headless: env_parse("HEADLESS").unwrap_or(base.headless),
            window_size: std::env::var("WINDOW_SIZE").unwrap_or(base.window_size),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(base.chrome_executable),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(base.browser_debug_port),
            cookies_dir: std::env::var("COOKIES_DIR").unwrap_or(base.cookies_dir),
            timeout_secs: env_parse("TIMEOUT_SECS").unwrap_or(base.timeout_secs),
            page_wait_timeout_secs: env_parse("PAGE_WAIT_TIMEOUT_SECS").unwrap_or(base.page_wait_timeout_secs),
            completion_timeout_secs: env_parse("COMPLETION_TIMEOUT_SECS").unwrap_or(base.completion_timeout_secs),
            question_delay_ms: env_parse("QUESTION_DELAY_MS").unwrap_or(base.question_delay_ms),
            auto_submit: env_parse("AUTO_SUBMIT").unwrap_or(base.auto_submit),
            dry_run: env_parse("DRY_RUN").unwrap_or(base.dry_run),
            restore_session_id: std::env::var("RESTORE_SESSION_ID").ok().or(base.restore_session_id),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(base.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(base.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(base.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(base.llm_model_name),
        }
    }

    /// 解析窗口尺寸，格式错误时回退到 1920x1080
    pub fn window_dimensions(&self) -> (u32, u32) {
        self.window_size
            .split_once(['x', 'X', ','])
            .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)))
            .unwrap_or((1920, 1080))
    }

    /// 页面导航超时
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn page_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.page_wait_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn question_delay(&self) -> Duration {
        Duration::from_millis(self.question_delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match parse_env_value(name, &value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("{}，已忽略", e);
            None
        }
    }
}

fn parse_env_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
        var_name: name.to_string(),
        value: value.to_string(),
        expected_type: std::any::type_name::<T>().to_string(),
    })
}
