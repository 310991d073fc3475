//! 结构选择器
//!
//! 把"看起来像题目"的匹配规则写成显式的结构谓词列表：
//! - 交给浏览器时渲染成 CSS 选择器
//! - 交给内存 DOM 时直接求值

use std::fmt;

/// 单个结构谓词
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 标签名（不区分大小写）
    Tag(&'static str),
    /// class 列表中包含该类名
    HasClass(&'static str),
    /// class 属性文本中包含该子串
    ClassContains(&'static str),
    /// 属性值完全相等
    AttrEquals(&'static str, String),
}

/// 可被谓词检查的节点
pub trait NodeAttributes {
    fn tag_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
}

impl Predicate {
    fn matches<N: NodeAttributes + ?Sized>(&self, node: &N) -> bool {
        match self {
            Predicate::Tag(tag) => node.tag_name().eq_ignore_ascii_case(tag),
            Predicate::HasClass(class) => node
                .attribute("class")
                .map(|c| c.split_whitespace().any(|token| token == *class))
                .unwrap_or(false),
            Predicate::ClassContains(fragment) => node
                .attribute("class")
                .map(|c| c.contains(fragment))
                .unwrap_or(false),
            Predicate::AttrEquals(name, value) => node.attribute(name) == Some(value.as_str()),
        }
    }

    fn write_css(&self, out: &mut String) {
        match self {
            Predicate::Tag(tag) => out.push_str(tag),
            Predicate::HasClass(class) => {
                out.push('.');
                out.push_str(class);
            }
            Predicate::ClassContains(fragment) => {
                out.push_str(&format!("[class*={}]", css_string(fragment)));
            }
            Predicate::AttrEquals(name, value) => {
                out.push_str(&format!("[{}={}]", name, css_string(value)));
            }
        }
    }
}

/// 选择器：多个备选项之间为"或"，备选项内部的谓词为"与"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Vec<Predicate>>,
}

impl Selector {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self {
            alternatives: vec![predicates],
        }
    }

    pub fn any_of(alternatives: Vec<Vec<Predicate>>) -> Self {
        Self { alternatives }
    }

    /// 节点是否满足任一备选项
    pub fn matches<N: NodeAttributes + ?Sized>(&self, node: &N) -> bool {
        self.alternatives
            .iter()
            .any(|preds| preds.iter().all(|p| p.matches(node)))
    }

    /// 渲染为 CSS 选择器（用逗号连接备选项）
    pub fn to_css(&self) -> String {
        self.alternatives
            .iter()
            .map(|preds| {
                let mut css = String::new();
                if !preds.iter().any(|p| matches!(p, Predicate::Tag(_))) {
                    css.push('*');
                }
                // 标签名必须写在最前面
                for p in preds.iter().filter(|p| matches!(p, Predicate::Tag(_))) {
                    p.write_css(&mut css);
                }
                for p in preds.iter().filter(|p| !matches!(p, Predicate::Tag(_))) {
                    p.write_css(&mut css);
                }
                css
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

fn css_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// 测验页面使用的结构模式
pub mod patterns {
    use super::{Predicate::*, Selector};

    /// 题目容器：class 中带 question 的任何元素
    pub fn question_container() -> Selector {
        Selector::any_of(vec![
            vec![HasClass("question")],
            vec![HasClass("quiz_question")],
            vec![ClassContains("question")],
        ])
    }

    /// 题目已渲染的标志（比容器模式更窄）
    pub fn question_ready() -> Selector {
        Selector::any_of(vec![vec![HasClass("question")], vec![HasClass("quiz_question")]])
    }

    /// 容器内的题干元素
    pub fn question_text() -> Selector {
        Selector::any_of(vec![
            vec![HasClass("question_text")],
            vec![HasClass("text")],
            vec![ClassContains("question_text")],
        ])
    }

    pub fn radio_input() -> Selector {
        input_of_type("radio")
    }

    pub fn checkbox_input() -> Selector {
        input_of_type("checkbox")
    }

    pub fn text_input() -> Selector {
        input_of_type("text")
    }

    pub fn textarea() -> Selector {
        Selector::new(vec![Tag("textarea")])
    }

    pub fn label_for(id: &str) -> Selector {
        Selector::new(vec![Tag("label"), AttrEquals("for", id.to_string())])
    }

    pub fn by_id(id: &str) -> Selector {
        Selector::new(vec![AttrEquals("id", id.to_string())])
    }

    /// 提交按钮
    pub fn submit_control() -> Selector {
        Selector::any_of(vec![
            vec![Tag("button"), AttrEquals("type", "submit".to_string())],
            vec![Tag("input"), AttrEquals("type", "submit".to_string())],
            vec![HasClass("submit_button")],
        ])
    }

    fn input_of_type(kind: &str) -> Selector {
        Selector::new(vec![Tag("input"), AttrEquals("type", kind.to_string())])
    }
}
