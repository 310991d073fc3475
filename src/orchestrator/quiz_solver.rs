//! 测验作答器 - 编排层
//!
//! ## 职责
//!
//! 1. **等待题目**：在超时内等待页面渲染出题目
//! 2. **提取题目**：委托给 `question_extractor`
//! 3. **逐题作答**：严格按提取顺序，复用同一个 `QuestionFlow`
//! 4. **自动提交**：可选，失败只记日志
//! 5. **统计输出**：返回完整的 `SolveReport`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::PageQuery;
use crate::models::selector::patterns;
use crate::models::{Question, SolveReport};
use crate::services::{question_extractor, CompletionService};
use crate::utils::logging;
use crate::workflow::{QuestionCtx, QuestionFlow};

/// 作答参数
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// 等待题目出现的超时
    pub page_wait_timeout: Duration,
    /// 单次 LLM 调用超时
    pub completion_timeout: Duration,
    /// 题目之间的间隔
    pub question_delay: Duration,
    pub verbose_logging: bool,
}

impl SolveOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_wait_timeout: config.page_wait_timeout(),
            completion_timeout: config.completion_timeout(),
            question_delay: config.question_delay(),
            verbose_logging: config.verbose_logging,
        }
    }
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 等待题目出现后提取
///
/// 超时或等待失败时返回空列表
pub async fn wait_and_extract(page: &dyn PageQuery, timeout: Duration) -> Vec<Question> {
    match page.wait_for(&patterns::question_ready(), timeout).await {
        Ok(true) => question_extractor::extract(page).await,
        Ok(false) => {
            warn!("⏱️ {} 秒内未发现题目", timeout.as_secs());
            Vec::new()
        }
        Err(e) => {
            warn!("等待题目失败: {}", e);
            Vec::new()
        }
    }
}

/// 作答整份测验
///
/// 单题失败只记录在对应的 outcome 中；返回的 outcome 数量总是等于题目数量
pub async fn solve_quiz(
    page: &dyn PageQuery,
    session_id: &str,
    completion: Arc<dyn CompletionService>,
    auto_submit: bool,
    options: &SolveOptions,
) -> SolveReport {
    let questions = wait_and_extract(page, options.page_wait_timeout).await;
    logging::log_solve_start(session_id, questions.len(), auto_submit);

    // 创建流程对象（只创建一次，复用）
    let flow = QuestionFlow::new(completion, options.completion_timeout).verbose(options.verbose_logging);

    let mut outcomes = Vec::with_capacity(questions.len());
    for (position, question) in questions.iter().enumerate() {
        if position > 0 && !options.question_delay.is_zero() {
            sleep(options.question_delay).await;
        }
        let ctx = QuestionCtx::new(session_id, question.index, questions.len());
        outcomes.push(flow.run(page, question, &ctx).await);
    }

    let submitted = if auto_submit {
        match submit_quiz(page).await {
            Ok(()) => {
                info!("[会话 {}] 📤 已提交测验", session_id);
                true
            }
            Err(e) => {
                warn!("[会话 {}] ⚠️ 自动提交失败: {}", session_id, e);
                false
            }
        }
    } else {
        false
    };

    SolveReport::new(outcomes, submitted)
}

/// 点击提交按钮
async fn submit_quiz(page: &dyn PageQuery) -> Result<()> {
    let button = page
        .find_one(&patterns::submit_control())
        .await?
        .ok_or_else(|| anyhow!("未找到提交按钮"))?;
    button.click().await
}
