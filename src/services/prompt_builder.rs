//! 提示词构建
//!
//! 纯函数：只看题型、题干和选项

use std::fmt::Write as _;

use crate::models::{option_letter, Modality, Question};

/// 论述题的回复长度上限
pub const ESSAY_MAX_TOKENS: u32 = 1000;
/// 其他题型的回复长度上限
pub const DEFAULT_MAX_TOKENS: u32 = 200;

/// 发给补全服务的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub max_tokens: u32,
}

pub fn build_prompt(question: &Question) -> Prompt {
    let q_text = &question.text;
    let text = match question.modality {
        Modality::MultipleChoice => with_options(
            format!(
                "Answer this multiple choice question. Return ONLY the letter (A, B, C, D, etc.) of the correct answer, nothing else.\n\nQuestion: {}\n\nOptions:\n",
                q_text
            ),
            question,
        ),
        Modality::MultipleSelect => with_options(
            format!(
                "Answer this multiple select question. Return ONLY the letters (e.g., 'A,C,D') of ALL correct answers separated by commas, nothing else.\n\nQuestion: {}\n\nOptions:\n",
                q_text
            ),
            question,
        ),
        Modality::Essay => format!(
            "Provide a comprehensive essay answer to this question:\n\n{}\n\nWrite a detailed, well-structured response.",
            q_text
        ),
        Modality::ShortAnswer => format!("Provide a concise, direct answer to this question:\n\n{}", q_text),
        Modality::Unknown => format!("Answer this question:\n\n{}", q_text),
    };

    Prompt {
        text,
        max_tokens: max_tokens_for(question.modality),
    }
}

pub fn max_tokens_for(modality: Modality) -> u32 {
    match modality {
        Modality::Essay => ESSAY_MAX_TOKENS,
        _ => DEFAULT_MAX_TOKENS,
    }
}

/// 追加 `A. xxx` 形式的选项列表
fn with_options(mut prompt: String, question: &Question) -> String {
    for (idx, option) in question.options.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", option_letter(idx), option.text);
    }
    prompt
}
