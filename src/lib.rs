//! # Quiz Autofill
//!
//! 一个用于自动作答网页测验的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Browser / Page），只暴露能力
//! - `PageQuery` / `ElementRef` / `PageDriver` - 页面能力接口
//! - `CdpPage` - 唯一的 page owner，基于 chromiumoxide 实现上述接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个 Question
//! - `question_extractor` / `label_resolver` - 题目与选项提取
//! - `prompt_builder` / `answer_parser` / `answer_applier` - 提示词、解析、写入
//! - `LlmService` - LLM 补全能力
//! - `CookieStore` - 会话 Cookie 存取
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionCtx` - 上下文封装（session_id + question_index）
//! - `QuestionFlow` - 流程编排（prompt → LLM → parse → apply）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session_manager` - 会话注册表
//! - `orchestrator/session` - 会话状态机，独占驱动句柄
//! - `orchestrator/quiz_solver` - 逐题作答与自动提交
//!
//! ## 模块结构

pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod test_support;

// 重新导出常用类型
pub use app::App;
pub use browser::{connect_to_browser, launch_browser, CdpLauncher};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::CdpPage;
pub use models::{AnswerOutcome, Modality, Question, QuestionSummary, SolveReport};
pub use orchestrator::{SessionManager, SessionState};
pub use services::{CompletionService, CookieStore, FileCookieStore, LlmService};
pub use workflow::{QuestionCtx, QuestionFlow};
