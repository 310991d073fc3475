//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 构建提示词 → 调用 LLM（带超时）
//! 2. 解析回复 → 写入页面
//! 3. LLM 失败时记录错误，不中断后续题目

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::infrastructure::PageQuery;
use crate::models::{Answer, AnswerOutcome, ParsedAnswer, Question};
use crate::services::{answer_applier, answer_parser, build_prompt, CompletionService};
use crate::utils::logging::truncate_text;
use crate::workflow::question_ctx::QuestionCtx;

/// 题目处理流程
///
/// - 编排单道题的 提示词 → LLM → 解析 → 写入
/// - 不持有页面资源，由调用方借出
/// - 返回值总是一条 AnswerOutcome，错误被收进记录里
pub struct QuestionFlow {
    completion: Arc<dyn CompletionService>,
    completion_timeout: Duration,
    verbose_logging: bool,
}

impl QuestionFlow {
    pub fn new(completion: Arc<dyn CompletionService>, completion_timeout: Duration) -> Self {
        Self {
            completion,
            completion_timeout,
            verbose_logging: false,
        }
    }

    pub fn verbose(mut self, verbose_logging: bool) -> Self {
        self.verbose_logging = verbose_logging;
        self
    }

    pub async fn run(&self, page: &dyn PageQuery, question: &Question, ctx: &QuestionCtx) -> AnswerOutcome {
        info!(
            "{} ({}) {}",
            ctx,
            question.modality,
            truncate_text(&question.text, 80)
        );

        let prompt = build_prompt(question);
        if self.verbose_logging {
            debug!("{} 提示词:\n{}", ctx, prompt.text);
        }

        let raw = match self.ask(&prompt.text, prompt.max_tokens).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{} ⚠️ LLM 调用失败: {}", ctx, e);
                return AnswerOutcome::failed(question, e);
            }
        };
        debug!("{} LLM 回复: {}", ctx, truncate_text(&raw, 120));

        let parsed = answer_parser::parse(question, &raw);
        if parsed == ParsedAnswer::Unresolved {
            warn!("{} 无法从回复中解析出有效选项: {}", ctx, truncate_text(&raw, 40));
        }

        let applied = answer_applier::apply(page, question, &parsed).await;
        if applied {
            info!("{} ✓ 已填写答案", ctx);
        } else {
            warn!("{} ⚠️ 答案未能写入页面", ctx);
        }

        AnswerOutcome::answered(&Answer {
            question,
            raw,
            parsed,
            applied,
        })
    }

    /// 调用 LLM，超时视为失败
    async fn ask(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        match tokio::time::timeout(self.completion_timeout, self.completion.complete(prompt, max_tokens)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                secs: self.completion_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeResult;
    use crate::services::question_extractor;
    use crate::test_support::{choice_question, text_question, FakeDom, ScriptedCompletion};

    fn flow(completion: ScriptedCompletion) -> QuestionFlow {
        QuestionFlow::new(Arc::new(completion), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_choice_question_is_answered() {
        let dom = FakeDom::new();
        let (_, inputs) = choice_question(&dom, "q1", "2 + 2 = ?", "radio", &["3", "4", "5"]);
        let questions = question_extractor::extract(&dom).await;

        let outcome = flow(ScriptedCompletion::always("B"))
            .run(&dom, &questions[0], &QuestionCtx::new("s", 0, 1))
            .await;

        assert!(outcome.is_applied());
        assert_eq!(dom.clicks(), vec![inputs[1]]);
        match outcome.result {
            OutcomeResult::Answered { raw_answer, .. } => assert_eq!(raw_answer, "B"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_essay_uses_large_budget() {
        let dom = FakeDom::new();
        let (_, input) = text_question(&dom, "q1", "Explain borrowing", true);
        let questions = question_extractor::extract(&dom).await;
        let completion = Arc::new(ScriptedCompletion::always("Borrowing lends access."));

        let outcome = QuestionFlow::new(completion.clone(), Duration::from_secs(5))
            .run(&dom, &questions[0], &QuestionCtx::new("s", 0, 1))
            .await;

        assert!(outcome.is_applied());
        assert_eq!(dom.value_of(input).as_deref(), Some("Borrowing lends access."));
        assert_eq!(completion.calls()[0].1, crate::services::prompt_builder::ESSAY_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_service_error_becomes_outcome_error() {
        let dom = FakeDom::new();
        text_question(&dom, "q1", "Name a planet", false);
        let questions = question_extractor::extract(&dom).await;

        let completion = ScriptedCompletion::new(|_, _| {
            Err(LlmError::EmptyContent {
                model: "m".into(),
            })
        });
        let outcome = flow(completion)
            .run(&dom, &questions[0], &QuestionCtx::new("s", 0, 1))
            .await;

        assert!(!outcome.is_applied());
        assert!(outcome.error().unwrap().contains("LLM返回内容为空"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_completion_times_out() {
        let dom = FakeDom::new();
        text_question(&dom, "q1", "Name a planet", false);
        let questions = question_extractor::extract(&dom).await;

        let completion = ScriptedCompletion::always("Mars").with_delay(Duration::from_secs(120));
        let outcome = QuestionFlow::new(Arc::new(completion), Duration::from_secs(30))
            .run(&dom, &questions[0], &QuestionCtx::new("s", 0, 1))
            .await;

        assert_eq!(outcome.error(), Some("LLM 调用超时 (30 秒)"));
    }

    #[tokio::test]
    async fn test_unparseable_choice_is_recorded_not_applied() {
        let dom = FakeDom::new();
        choice_question(&dom, "q1", "Pick", "radio", &["a", "b"]);
        let questions = question_extractor::extract(&dom).await;

        let outcome = flow(ScriptedCompletion::always("I am not sure"))
            .run(&dom, &questions[0], &QuestionCtx::new("s", 0, 1))
            .await;

        assert!(outcome.error().is_none());
        assert!(!outcome.is_applied());
        assert!(dom.clicks().is_empty());
    }
}
