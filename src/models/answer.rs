use std::collections::BTreeSet;

use serde::Serialize;

use super::question::{Modality, Question};

/// 解析后的答案
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAnswer {
    /// 单选：选项序号
    Single(usize),
    /// 多选：选项序号集合（可能为空）
    Multiple(BTreeSet<usize>),
    /// 文本答案
    Text(String),
    /// 单选未能解析出有效选项
    Unresolved,
}

/// 一道题的作答记录
#[derive(Debug, Clone)]
pub struct Answer<'q> {
    pub question: &'q Question,
    pub raw: String,
    pub parsed: ParsedAnswer,
    /// 是否成功写入页面
    pub applied: bool,
}

/// 单题处理结果（对外输出）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub index: usize,
    pub text: String,
    #[serde(flatten)]
    pub result: OutcomeResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutcomeResult {
    Answered {
        modality: Modality,
        #[serde(rename = "rawAnswer")]
        raw_answer: String,
        applied: bool,
    },
    Failed {
        error: String,
    },
}

impl AnswerOutcome {
    pub fn answered(answer: &Answer<'_>) -> Self {
        Self {
            index: answer.question.index,
            text: answer.question.text.clone(),
            result: OutcomeResult::Answered {
                modality: answer.question.modality,
                raw_answer: answer.raw.clone(),
                applied: answer.applied,
            },
        }
    }

    pub fn failed(question: &Question, error: impl ToString) -> Self {
        Self {
            index: question.index,
            text: question.text.clone(),
            result: OutcomeResult::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self.result, OutcomeResult::Answered { applied: true, .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.result {
            OutcomeResult::Failed { error } => Some(error),
            OutcomeResult::Answered { .. } => None,
        }
    }
}

/// 整份测验的作答报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveReport {
    pub outcomes: Vec<AnswerOutcome>,
    pub total_questions: usize,
    pub answered_questions: usize,
    /// 是否已点击提交
    pub submitted: bool,
}

impl SolveReport {
    pub fn new(outcomes: Vec<AnswerOutcome>, submitted: bool) -> Self {
        let answered_questions = outcomes.iter().filter(|o| o.is_applied()).count();
        Self {
            total_questions: outcomes.len(),
            answered_questions,
            outcomes,
            submitted,
        }
    }

    pub fn failed_questions(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error().is_some()).count()
    }
}
