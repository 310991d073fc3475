//! CDP 页面驱动 - 基础设施层
//!
//! 持有唯一的 Browser / Page 资源，把 chromiumoxide 的能力包装成 `PageDriver`

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::page::{ElementRef, PageDriver, PageQuery, ParentInfo};
use crate::models::{Selector, StoredCookie};

/// 读取父元素标签和文本
const PARENT_INFO_JS: &str = r#"function() {
    const p = this.parentElement;
    if (!p) { return null; }
    return JSON.stringify({ tag: p.tagName, text: p.innerText || "" });
}"#;

/// 清空输入控件并触发 input / change 事件
const CLEAR_VALUE_JS: &str = r#"function() {
    this.focus();
    this.value = "";
    this.dispatchEvent(new Event("input", { bubbles: true }));
    this.dispatchEvent(new Event("change", { bubbles: true }));
    return true;
}"#;

/// CDP 页面
///
/// 职责：
/// - 持有唯一的 Browser / Page 资源
/// - 暴露查询、点击、输入、Cookie 能力
/// - 不认识 Question / Answer
pub struct CdpPage {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// 浏览器是否由本程序启动（连接到外部浏览器时只关闭页面）
    owns_browser: bool,
}

impl CdpPage {
    pub fn new(browser: Browser, page: Page, handler: JoinHandle<()>, owns_browser: bool) -> Self {
        Self {
            browser,
            page,
            handler,
            owns_browser,
        }
    }
}

fn wrap_elements(elements: Vec<Element>) -> Vec<Box<dyn ElementRef>> {
    elements
        .into_iter()
        .map(|element| Box::new(CdpElement { element }) as Box<dyn ElementRef>)
        .collect()
}

#[async_trait]
impl PageQuery for CdpPage {
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementRef>>> {
        let elements = self
            .page
            .find_elements(selector.to_css())
            .await
            .with_context(|| format!("查询元素失败: {}", selector))?;
        Ok(wrap_elements(elements))
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        // 某些页面 goto 返回时仍在加载
        if let Err(e) = self.page.wait_for_navigation().await {
            debug!("等待页面加载完成失败: {}", e);
        }
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.page.reload().await.context("刷新页面失败")?;
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>> {
        let cookies = self.page.get_cookies().await.context("读取 Cookie 失败")?;
        Ok(cookies
            .into_iter()
            .map(|c| StoredCookie {
                expires: (!c.session && c.expires > 0.0).then_some(c.expires),
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect())
    }

    async fn add_cookie(&self, cookie: &StoredCookie) -> Result<()> {
        let mut builder = CookieParam::builder()
            .name(cookie.name.clone())
            .value(cookie.value.clone())
            .domain(cookie.domain.clone())
            .path(cookie.path.clone())
            .http_only(cookie.http_only)
            .secure(cookie.secure);
        if let Some(expires) = cookie.expires {
            builder = builder.expires(TimeSinceEpoch::new(expires));
        }
        let param = builder
            .build()
            .map_err(|e| anyhow::anyhow!("构建 Cookie 参数失败: {}", e))?;
        self.page
            .set_cookie(param)
            .await
            .with_context(|| format!("写入 Cookie {} 失败", cookie.name))?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        if self.owns_browser {
            self.browser.close().await.context("关闭浏览器失败")?;
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
        } else {
            self.page.clone().close().await.context("关闭页面失败")?;
        }
        self.handler.abort();
        Ok(())
    }

    fn as_query(&self) -> &dyn PageQuery {
        self
    }
}

/// CDP 元素
pub struct CdpElement {
    element: Element,
}

#[async_trait]
impl ElementRef for CdpElement {
    async fn text(&self) -> Result<String> {
        Ok(self.element.inner_text().await?.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.element.attribute(name).await?)
    }

    async fn parent(&self) -> Result<Option<ParentInfo>> {
        #[derive(serde::Deserialize)]
        struct Raw {
            tag: String,
            text: String,
        }

        let returns = self.element.call_js_fn(PARENT_INFO_JS, false).await?;
        let Some(JsonValue::String(raw)) = returns.result.value else {
            return Ok(None);
        };
        let raw: Raw = serde_json::from_str(&raw)?;
        Ok(Some(ParentInfo {
            tag_name: raw.tag,
            text: raw.text,
        }))
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementRef>>> {
        let elements = self
            .element
            .find_elements(selector.to_css())
            .await
            .with_context(|| format!("查询子元素失败: {}", selector))?;
        Ok(wrap_elements(elements))
    }

    async fn click(&self) -> Result<()> {
        self.element.click().await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.element.call_js_fn(CLEAR_VALUE_JS, false).await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.element.focus().await?;
        self.element.type_str(text).await?;
        Ok(())
    }
}
