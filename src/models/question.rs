use std::fmt;

use serde::{Deserialize, Serialize};

use super::selector::{patterns, Predicate, Selector};

/// 题目作答形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// 单选（radio）
    MultipleChoice,
    /// 多选（checkbox）
    MultipleSelect,
    /// 论述（textarea）
    Essay,
    /// 简答（text input）
    ShortAnswer,
    Unknown,
}

impl Modality {
    /// 是否为选项类题目
    pub fn is_choice(self) -> bool {
        matches!(self, Modality::MultipleChoice | Modality::MultipleSelect)
    }

    /// 是否为文本类题目
    pub fn is_text(self) -> bool {
        matches!(self, Modality::Essay | Modality::ShortAnswer)
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modality::MultipleChoice => "multiple_choice",
            Modality::MultipleSelect => "multiple_select",
            Modality::Essay => "essay",
            Modality::ShortAnswer => "short_answer",
            Modality::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// 页面控件的定位句柄
///
/// 优先使用 id；没有 id 的选项控件退回到 name + value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ControlRef {
    Id(String),
    NameValue { name: String, value: String },
    Name(String),
}

impl ControlRef {
    /// 根据控件属性构建句柄，属性都缺失时返回 None
    pub fn from_attributes(id: Option<String>, name: Option<String>, value: Option<&str>) -> Option<Self> {
        if let Some(id) = id.filter(|s| !s.is_empty()) {
            return Some(ControlRef::Id(id));
        }
        let name = name.filter(|s| !s.is_empty())?;
        Some(match value {
            Some(value) => ControlRef::NameValue {
                name,
                value: value.to_string(),
            },
            None => ControlRef::Name(name),
        })
    }

    pub fn selector(&self) -> Selector {
        match self {
            ControlRef::Id(id) => patterns::by_id(id),
            ControlRef::NameValue { name, value } => Selector::new(vec![
                Predicate::AttrEquals("name", name.clone()),
                Predicate::AttrEquals("value", value.clone()),
            ]),
            ControlRef::Name(name) => Selector::new(vec![Predicate::AttrEquals("name", name.clone())]),
        }
    }
}

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOption {
    /// 标签文本（无法解析时为 "Option"）
    pub text: String,
    /// 控件 value 属性
    pub value: String,
    pub control: Option<ControlRef>,
}

/// 从页面提取出的题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// 在保留下来的题目中的序号（从 0 开始，连续）
    pub index: usize,
    pub text: String,
    pub modality: Modality,
    /// 仅选项类题目非空
    pub options: Vec<QuestionOption>,
    /// 文本类题目的输入控件
    pub input: Option<ControlRef>,
}

impl Question {
    pub fn summary(&self) -> QuestionSummary {
        QuestionSummary {
            index: self.index,
            text: self.text.clone(),
            modality: self.modality,
            options: self
                .options
                .iter()
                .map(|o| OptionSummary { text: o.text.clone() })
                .collect(),
        }
    }
}

/// 选项序号对应的字母（0 → A）
pub fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .and_then(|i| b'A'.checked_add(i))
        .map(char::from)
        .unwrap_or('?')
}

/// 对外暴露的题目摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionSummary {
    pub index: usize,
    pub text: String,
    #[serde(rename = "type")]
    pub modality: Modality,
    pub options: Vec<OptionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSummary {
    pub text: String,
}
