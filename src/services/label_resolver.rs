//! 选项标签解析
//!
//! 按顺序尝试三种策略，第一个得到非空文本的策略胜出：
//! 1. 父元素就是 `<label>` → 父元素文本
//! 2. 控件有 id → `label[for=id]` 的文本
//! 3. 父元素文本
//!
//! 全部失败时返回 "Option"，从不返回错误

use tracing::debug;

use crate::infrastructure::{ElementRef, PageQuery};
use crate::models::selector::patterns;

/// 无法解析时使用的占位文本
pub const FALLBACK_LABEL: &str = "Option";

pub async fn resolve(page: &dyn PageQuery, control: &dyn ElementRef) -> String {
    let parent = match control.parent().await {
        Ok(parent) => parent,
        Err(e) => {
            debug!("读取父元素失败: {}", e);
            None
        }
    };

    if let Some(parent) = &parent {
        if parent.tag_name.eq_ignore_ascii_case("label") {
            let text = parent.text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    if let Some(text) = label_for_control(page, control).await {
        return text;
    }

    parent
        .map(|p| p.text.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_LABEL.to_string())
}

async fn label_for_control(page: &dyn PageQuery, control: &dyn ElementRef) -> Option<String> {
    let id = control.attribute("id").await.ok().flatten().filter(|id| !id.is_empty())?;
    let label = page.find_one(&patterns::label_for(&id)).await.ok().flatten()?;
    let text = label.text().await.ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeDom;

    async fn resolve_first_radio(dom: &FakeDom) -> String {
        let control = dom
            .find_one(&patterns::radio_input())
            .await
            .unwrap()
            .expect("radio present");
        resolve(dom, control.as_ref()).await
    }

    #[tokio::test]
    async fn test_wrapping_label_wins() {
        let dom = FakeDom::new();
        let label = dom.add(FakeDom::ROOT, "label", &[("for", "other")], "  Paris ");
        dom.add(label, "input", &[("type", "radio"), ("id", "r1")], "");
        dom.add(FakeDom::ROOT, "label", &[("for", "r1")], "Wrong");

        assert_eq!(resolve_first_radio(&dom).await, "Paris");
    }

    #[tokio::test]
    async fn test_label_for_id() {
        let dom = FakeDom::new();
        let row = dom.add(FakeDom::ROOT, "div", &[("class", "answer")], "row text");
        dom.add(row, "input", &[("type", "radio"), ("id", "r1")], "");
        dom.add(FakeDom::ROOT, "label", &[("for", "r1")], " London ");

        assert_eq!(resolve_first_radio(&dom).await, "London");
    }

    #[tokio::test]
    async fn test_parent_text_fallback() {
        let dom = FakeDom::new();
        let row = dom.add(FakeDom::ROOT, "div", &[], "");
        dom.add(row, "input", &[("type", "radio"), ("id", "r1")], "");
        dom.add(row, "span", &[], "Berlin");

        assert_eq!(resolve_first_radio(&dom).await, "Berlin");
    }

    #[tokio::test]
    async fn test_placeholder_when_nothing_resolves() {
        let dom = FakeDom::new();
        let row = dom.add(FakeDom::ROOT, "div", &[], "");
        dom.add(row, "input", &[("type", "radio")], "");

        assert_eq!(resolve_first_radio(&dom).await, FALLBACK_LABEL);
    }

    #[tokio::test]
    async fn test_empty_label_falls_through() {
        let dom = FakeDom::new();
        let row = dom.add(FakeDom::ROOT, "div", &[], "Rome");
        dom.add(row, "input", &[("type", "radio"), ("id", "r1")], "");
        dom.add(FakeDom::ROOT, "label", &[("for", "r1")], "   ");

        assert_eq!(resolve_first_radio(&dom).await, "Rome");
    }
}
