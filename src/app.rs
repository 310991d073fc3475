//! 应用入口 - 编排层之上
//!
//! 负责组装浏览器启动器、LLM 服务和 Cookie 存储，并跑完一次会话

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::browser::CdpLauncher;
use crate::config::Config;
use crate::error::AppResult;
use crate::orchestrator::SessionManager;
use crate::services::{CompletionService, FileCookieStore, LlmService};
use crate::utils::logging::{self, log_startup, print_solve_stats};

/// 初始化日志并加载配置
///
/// 日志要先于配置就绪，配置文件或环境变量的解析警告才能输出
pub fn load_config(path: impl AsRef<Path>) -> Config {
    logging::init(logging::verbose_from_env());
    let config = Config::load(path);
    logging::set_verbose(config.verbose_logging);
    config
}

/// 应用主结构
pub struct App {
    config: Config,
    manager: SessionManager,
    completion: Arc<dyn CompletionService>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        log_startup(&config.target_url, &config.llm_model_name, config.headless);

        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 LLM_API_KEY，LLM 调用将会失败");
        }

        let manager = SessionManager::new(
            Arc::new(CdpLauncher::new(&config)),
            Arc::new(FileCookieStore::new(&config.cookies_dir)),
            &config,
        );
        let completion: Arc<dyn CompletionService> = Arc::new(LlmService::new(&config));

        Self {
            config,
            manager,
            completion,
        }
    }

    /// 运行应用主逻辑
    ///
    /// 无论作答是否成功，最后都会关闭会话（保存 Cookie）
    pub async fn run(&self) -> AppResult<()> {
        let id = self.open_session().await?;
        let result = self.work(&id).await;
        self.manager.close_session(&id).await;
        info!("🔑 会话 ID: {} (设置 RESTORE_SESSION_ID 可复用登录状态)", id);
        result
    }

    /// 优先恢复已保存的会话，没有保存记录时新建
    async fn open_session(&self) -> AppResult<String> {
        if let Some(saved_id) = &self.config.restore_session_id {
            let restored = self
                .manager
                .restore_session(saved_id, &self.config.target_url, self.completion.clone())
                .await?;
            if restored {
                info!("♻️ 已恢复会话 {}", saved_id);
                return Ok(saved_id.clone());
            }
            warn!("⚠️ 会话 {} 没有保存的 Cookie，新建会话", saved_id);
        }
        self.manager
            .start_session(&self.config.target_url, self.completion.clone())
            .await
    }

    async fn work(&self, id: &str) -> AppResult<()> {
        self.manager.navigate(id).await?;

        if self.config.dry_run {
            let questions = self.manager.extract_questions(id).await?;
            info!("🔍 仅提取模式: 共 {} 道题", questions.len());
            println!("{}", serde_json::to_string_pretty(&questions)?);
            return Ok(());
        }

        let report = self.manager.solve_quiz(id, self.config.auto_submit).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        print_solve_stats(&report);
        Ok(())
    }
}
