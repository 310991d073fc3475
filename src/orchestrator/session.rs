//! 会话 - 编排层
//!
//! 一个会话独占一个浏览器驱动句柄：
//!
//! ```text
//! Created --start--> BrowserActive --navigate--> Navigated --close--> Closed
//! Created --restore(cookies)--> BrowserActive
//! ```
//!
//! 关闭时先保存 Cookie，再释放驱动

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::quiz_solver::{self, SolveOptions};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{DriverLauncher, PageDriver};
use crate::models::{Question, SolveReport, StoredCookie};
use crate::services::{CompletionService, CookieStore};

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Created,
    BrowserActive,
    Navigated,
    Closed,
}

impl SessionState {
    /// 是否持有可用的驱动
    pub fn is_ready(self) -> bool {
        matches!(self, SessionState::BrowserActive | SessionState::Navigated)
    }
}

pub struct Session {
    id: String,
    target_url: String,
    state: SessionState,
    driver: Option<Box<dyn PageDriver>>,
    completion: Arc<dyn CompletionService>,
}

impl Session {
    /// 新建会话（生成随机 ID）
    pub fn new(target_url: impl Into<String>, completion: Arc<dyn CompletionService>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), target_url, completion)
    }

    /// 使用指定 ID 新建会话（恢复已保存的会话时使用）
    pub fn with_id(id: impl Into<String>, target_url: impl Into<String>, completion: Arc<dyn CompletionService>) -> Self {
        Self {
            id: id.into(),
            target_url: target_url.into(),
            state: SessionState::Created,
            driver: None,
            completion,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// 启动浏览器
    pub async fn start(&mut self, launcher: &dyn DriverLauncher) -> AppResult<()> {
        if self.state != SessionState::Created {
            return Err(AppError::not_ready(&self.id, self.state));
        }
        let driver = launcher.launch().await.map_err(AppError::browser_launch_failed)?;
        self.driver = Some(driver);
        self.state = SessionState::BrowserActive;
        info!("[会话 {}] 🚀 浏览器已启动", self.id);
        Ok(())
    }

    /// 打开目标页面
    pub async fn navigate(&mut self, timeout: Duration) -> AppResult<()> {
        let url = self.target_url.clone();
        let driver = self.driver()?;
        info!("[会话 {}] 🌐 正在打开 {}", self.id, url);
        goto_with_timeout(driver, &url, timeout).await?;
        self.state = SessionState::Navigated;
        info!("[会话 {}] ✓ 页面已加载", self.id);
        Ok(())
    }

    /// 用保存的 Cookie 恢复登录状态
    ///
    /// 单个 Cookie 写入失败只会跳过该 Cookie
    pub async fn restore(
        &mut self,
        launcher: &dyn DriverLauncher,
        cookies: &[StoredCookie],
        timeout: Duration,
    ) -> AppResult<()> {
        if self.state != SessionState::Created {
            return Err(AppError::not_ready(&self.id, self.state));
        }
        let mut driver = launcher.launch().await.map_err(AppError::browser_launch_failed)?;

        if let Err(e) = goto_with_timeout(driver.as_ref(), &self.target_url, timeout).await {
            if let Err(close_err) = driver.shutdown().await {
                warn!("[会话 {}] 释放浏览器失败: {}", self.id, close_err);
            }
            return Err(e);
        }

        let mut restored = 0;
        for cookie in cookies {
            match driver.add_cookie(cookie).await {
                Ok(()) => restored += 1,
                Err(e) => debug!("[会话 {}] 跳过 Cookie {}: {}", self.id, cookie.name, e),
            }
        }
        if let Err(e) = driver.reload().await {
            warn!("[会话 {}] 刷新页面失败: {}", self.id, e);
        }

        self.driver = Some(driver);
        self.state = SessionState::BrowserActive;
        info!("[会话 {}] 🍪 已恢复 {}/{} 个 Cookie", self.id, restored, cookies.len());
        Ok(())
    }

    /// 借出驱动，会话未就绪时返回错误
    pub fn driver(&self) -> AppResult<&dyn PageDriver> {
        match (&self.driver, self.state.is_ready()) {
            (Some(driver), true) => Ok(driver.as_ref()),
            _ => Err(AppError::not_ready(&self.id, self.state)),
        }
    }

    /// 提取当前页面的题目
    pub async fn extract(&self, options: &SolveOptions) -> AppResult<Vec<Question>> {
        let driver = self.driver()?;
        Ok(quiz_solver::wait_and_extract(driver.as_query(), options.page_wait_timeout).await)
    }

    /// 作答当前页面的测验
    pub async fn solve(&self, auto_submit: bool, options: &SolveOptions) -> AppResult<SolveReport> {
        let driver = self.driver()?;
        Ok(quiz_solver::solve_quiz(driver.as_query(), &self.id, self.completion.clone(), auto_submit, options).await)
    }

    /// 关闭会话：先保存 Cookie，再释放驱动
    ///
    /// 保存失败只记录警告；重复关闭不做任何事
    pub async fn close(&mut self, store: &dyn CookieStore) {
        if self.state == SessionState::Closed {
            return;
        }

        if let Some(mut driver) = self.driver.take() {
            match driver.cookies().await {
                Ok(cookies) => match store.save(&self.id, &cookies).await {
                    Ok(()) => debug!("[会话 {}] 已保存 {} 个 Cookie", self.id, cookies.len()),
                    Err(e) => warn!("[会话 {}] ⚠️ 保存 Cookie 失败: {}", self.id, e),
                },
                Err(e) => warn!("[会话 {}] ⚠️ 读取 Cookie 失败: {}", self.id, e),
            }

            if let Err(e) = driver.shutdown().await {
                warn!("[会话 {}] ⚠️ 关闭浏览器失败: {}", self.id, e);
            }
        }

        self.state = SessionState::Closed;
        info!("[会话 {}] 🔒 会话已关闭", self.id);
    }
}

async fn goto_with_timeout(driver: &dyn PageDriver, url: &str, timeout: Duration) -> AppResult<()> {
    match tokio::time::timeout(timeout, driver.goto(url)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(AppError::navigation_failed(url, e)),
        Err(elapsed) => Err(AppError::navigation_failed(url, elapsed)),
    }
}
