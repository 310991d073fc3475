//! 回复解析
//!
//! 把补全服务的原始文本按题型解析成结构化答案，不接触页面

use std::collections::BTreeSet;

use crate::models::{Modality, ParsedAnswer, Question};

pub fn parse(question: &Question, raw: &str) -> ParsedAnswer {
    let option_count = question.options.len();
    match question.modality {
        Modality::MultipleChoice => raw
            .chars()
            .find(|c| c.is_alphabetic())
            .and_then(letter_index)
            .filter(|idx| *idx < option_count)
            .map(ParsedAnswer::Single)
            .unwrap_or(ParsedAnswer::Unresolved),
        Modality::MultipleSelect => {
            let indices: BTreeSet<usize> = raw
                .split(',')
                .filter_map(token_index)
                .filter(|idx| *idx < option_count)
                .collect();
            ParsedAnswer::Multiple(indices)
        }
        Modality::Essay | Modality::ShortAnswer | Modality::Unknown => ParsedAnswer::Text(raw.trim().to_string()),
    }
}

/// 字母转选项序号（A → 0），非 ASCII 字母返回 None
fn letter_index(c: char) -> Option<usize> {
    let upper = c.to_ascii_uppercase();
    upper
        .is_ascii_uppercase()
        .then(|| usize::from(upper as u8 - b'A'))
}

/// 多选的单个片段，例如 " c " 或 "'B'"
fn token_index(token: &str) -> Option<usize> {
    let token = token.trim_matches(|c: char| !c.is_alphanumeric());
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => letter_index(c),
        _ => None,
    }
}
