//! 会话管理器 - 编排层
//!
//! 进程内的会话注册表，对外提供按会话 ID 调用的全部操作。
//! 注册表本身只在插入 / 查找 / 删除时加锁；同一会话的操作由会话自己的锁串行化，
//! 不同会话之间可以并行。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use super::quiz_solver::SolveOptions;
use super::session::{Session, SessionState};
use crate::config::Config;
use crate::error::{AppError, AppResult, SessionError};
use crate::infrastructure::DriverLauncher;
use crate::models::{QuestionSummary, SolveReport};
use crate::services::{CompletionService, CookieStore};

type SessionHandle = Arc<Mutex<Session>>;

pub struct SessionManager {
    sessions: Mutex<HashMap<String, SessionHandle>>,
    launcher: Arc<dyn DriverLauncher>,
    cookie_store: Arc<dyn CookieStore>,
    solve_options: SolveOptions,
    navigation_timeout: Duration,
    session_limit: Option<usize>,
}

impl SessionManager {
    pub fn new(launcher: Arc<dyn DriverLauncher>, cookie_store: Arc<dyn CookieStore>, config: &Config) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            launcher,
            cookie_store,
            solve_options: SolveOptions::from_config(config),
            navigation_timeout: config.navigation_timeout(),
            // 外部浏览器只有一个 Cookie 存储，多个会话会互相覆盖登录状态
            session_limit: config.browser_debug_port.map(|_| 1),
        }
    }

    pub fn with_solve_options(mut self, options: SolveOptions) -> Self {
        self.solve_options = options;
        self
    }

    /// 新建会话并启动浏览器，返回会话 ID
    pub async fn start_session(
        &self,
        target_url: impl Into<String>,
        completion: Arc<dyn CompletionService>,
    ) -> AppResult<String> {
        self.check_capacity(&*self.sessions.lock().await)?;
        let mut session = Session::new(target_url, completion);
        session.start(self.launcher.as_ref()).await?;
        let id = session.id().to_string();

        let mut sessions = self.sessions.lock().await;
        if let Err(e) = self.check_capacity(&sessions) {
            drop(sessions);
            session.close(self.cookie_store.as_ref()).await;
            return Err(e);
        }
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        Ok(id)
    }

    pub async fn navigate(&self, id: &str) -> AppResult<()> {
        let handle = self.get(id).await?;
        let mut session = handle.lock().await;
        session.navigate(self.navigation_timeout).await
    }

    pub async fn extract_questions(&self, id: &str) -> AppResult<Vec<QuestionSummary>> {
        let handle = self.get(id).await?;
        let session = handle.lock().await;
        let questions = session.extract(&self.solve_options).await?;
        Ok(questions.iter().map(|q| q.summary()).collect())
    }

    pub async fn solve_quiz(&self, id: &str, auto_submit: bool) -> AppResult<SolveReport> {
        let handle = self.get(id).await?;
        let session = handle.lock().await;
        session.solve(auto_submit, &self.solve_options).await
    }

    /// 关闭并注销会话；未知 ID 不做任何事
    pub async fn close_session(&self, id: &str) {
        let Ok(handle) = self.get(id).await else {
            return;
        };
        handle.lock().await.close(self.cookie_store.as_ref()).await;
        self.sessions.lock().await.remove(id);
    }

    /// 用保存的 Cookie 恢复会话
    ///
    /// 没有保存过 Cookie 时返回 false，且不会启动浏览器
    pub async fn restore_session(
        &self,
        id: &str,
        target_url: impl Into<String>,
        completion: Arc<dyn CompletionService>,
    ) -> AppResult<bool> {
        {
            let sessions = self.sessions.lock().await;
            if sessions.contains_key(id) {
                return Err(already_active(id));
            }
            self.check_capacity(&sessions)?;
        }
        let Some(cookies) = self.cookie_store.load(id).await? else {
            info!("[会话 {}] 没有可恢复的 Cookie", id);
            return Ok(false);
        };

        let mut session = Session::with_id(id, target_url, completion);
        session
            .restore(self.launcher.as_ref(), &cookies, self.navigation_timeout)
            .await?;

        let mut sessions = self.sessions.lock().await;
        let conflict = if sessions.contains_key(id) {
            Err(already_active(id))
        } else {
            self.check_capacity(&sessions)
        };
        if let Err(e) = conflict {
            drop(sessions);
            session.close(self.cookie_store.as_ref()).await;
            return Err(e);
        }
        sessions.insert(id.to_string(), Arc::new(Mutex::new(session)));
        Ok(true)
    }

    pub async fn session_state(&self, id: &str) -> AppResult<SessionState> {
        let handle = self.get(id).await?;
        let state = handle.lock().await.state();
        Ok(state)
    }

    /// 当前注册的会话数量
    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn check_capacity(&self, sessions: &HashMap<String, SessionHandle>) -> AppResult<()> {
        match self.session_limit {
            Some(limit) if sessions.len() >= limit => {
                Err(AppError::Session(SessionError::LimitReached { limit }))
            }
            _ => Ok(()),
        }
    }

    async fn get(&self, id: &str) -> AppResult<SessionHandle> {
        self.sessions
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::session_not_found(id))
    }
}

fn already_active(id: &str) -> AppError {
    AppError::Session(SessionError::AlreadyActive { id: id.to_string() })
}
