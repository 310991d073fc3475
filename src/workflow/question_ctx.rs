//! 题目处理上下文
//!
//! 封装"我正在处理哪个会话的第几题"这一信息

use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 会话ID
    pub session_id: String,

    /// 题目序号（从0开始，与 Question::index 一致）
    pub question_index: usize,

    /// 本次作答的题目总数（仅用于日志显示）
    pub total: usize,
}

impl QuestionCtx {
    pub fn new(session_id: impl Into<String>, question_index: usize, total: usize) -> Self {
        Self {
            session_id: session_id.into(),
            question_index,
            total,
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 {} 题目#{}/{}]",
            self.session_id,
            self.question_index + 1,
            self.total
        )
    }
}
