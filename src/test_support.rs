//! 测试用的内存页面与脚本化 LLM

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::error::LlmError;
use crate::infrastructure::{DriverLauncher, ElementRef, PageDriver, PageQuery, ParentInfo};
use crate::models::{NodeAttributes, Selector, StoredCookie};
use crate::services::CompletionService;

pub struct FakeNode {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl NodeAttributes for FakeNode {
    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct DomState {
    nodes: Vec<FakeNode>,
    clicks: Vec<usize>,
    failing_clicks: HashSet<usize>,
    failing_queries: bool,
    failing_goto: bool,
    cookies: Vec<StoredCookie>,
    rejected_cookies: HashSet<String>,
    visited: Vec<String>,
    reloads: usize,
    shutdowns: usize,
    interactions: usize,
}

impl DomState {
    /// 按文档顺序（先序）列出后代节点
    fn descendants(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[node].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    fn text_of(&self, node: usize) -> String {
        std::iter::once(node)
            .chain(self.descendants(node))
            .map(|id| self.nodes[id].text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 内存 DOM
///
/// 同时实现 `PageQuery` / `PageDriver`，并记录所有页面写操作
#[derive(Clone)]
pub struct FakeDom {
    state: Arc<Mutex<DomState>>,
}

impl FakeDom {
    pub const ROOT: usize = 0;

    pub fn new() -> Self {
        let root = FakeNode {
            tag: "body".to_string(),
            attrs: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        };
        let state = DomState {
            nodes: vec![root],
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DomState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 追加子节点，返回节点编号
    pub fn add(&self, parent: usize, tag: &str, attrs: &[(&str, &str)], text: &str) -> usize {
        let mut state = self.lock();
        let id = state.nodes.len();
        state.nodes.push(FakeNode {
            tag: tag.to_string(),
            attrs: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            text: text.to_string(),
            parent: Some(parent),
            children: Vec::new(),
        });
        state.nodes[parent].children.push(id);
        id
    }

    pub fn clicks(&self) -> Vec<usize> {
        self.lock().clicks.clone()
    }

    pub fn value_of(&self, node: usize) -> Option<String> {
        self.lock().nodes[node].attrs.get("value").cloned()
    }

    pub fn fail_clicks_on(&self, node: usize) {
        self.lock().failing_clicks.insert(node);
    }

    /// 之后的所有查询都返回错误
    pub fn fail_queries(&self) {
        self.lock().failing_queries = true;
    }

    /// 之后的所有导航都返回错误
    pub fn fail_goto(&self) {
        self.lock().failing_goto = true;
    }

    pub fn reject_cookie(&self, name: &str) {
        self.lock().rejected_cookies.insert(name.to_string());
    }

    pub fn set_cookies(&self, cookies: Vec<StoredCookie>) {
        self.lock().cookies = cookies;
    }

    pub fn cookie_names(&self) -> Vec<String> {
        self.lock().cookies.iter().map(|c| c.name.clone()).collect()
    }

    pub fn visited(&self) -> Vec<String> {
        self.lock().visited.clone()
    }

    pub fn reloads(&self) -> usize {
        self.lock().reloads
    }

    pub fn shutdowns(&self) -> usize {
        self.lock().shutdowns
    }

    /// 驱动被调用的总次数
    pub fn interactions(&self) -> usize {
        self.lock().interactions
    }

    fn query(&self, scope: usize, selector: &Selector) -> Result<Vec<Box<dyn ElementRef>>> {
        let mut state = self.lock();
        state.interactions += 1;
        if state.failing_queries {
            bail!("查询失败: {}", selector);
        }
        let found = state
            .descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(&state.nodes[*id]))
            .map(|node| {
                Box::new(FakeElement {
                    dom: self.clone(),
                    node,
                }) as Box<dyn ElementRef>
            })
            .collect();
        Ok(found)
    }
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FakeElement {
    dom: FakeDom,
    node: usize,
}

#[async_trait]
impl ElementRef for FakeElement {
    async fn text(&self) -> Result<String> {
        let mut state = self.dom.lock();
        state.interactions += 1;
        Ok(state.text_of(self.node))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let mut state = self.dom.lock();
        state.interactions += 1;
        Ok(state.nodes[self.node].attrs.get(name).cloned())
    }

    async fn parent(&self) -> Result<Option<ParentInfo>> {
        let mut state = self.dom.lock();
        state.interactions += 1;
        Ok(state.nodes[self.node].parent.map(|p| ParentInfo {
            tag_name: state.nodes[p].tag.to_uppercase(),
            text: state.text_of(p),
        }))
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementRef>>> {
        self.dom.query(self.node, selector)
    }

    async fn click(&self) -> Result<()> {
        let mut state = self.dom.lock();
        state.interactions += 1;
        if state.failing_clicks.contains(&self.node) {
            bail!("元素不可点击: {}", self.node);
        }
        state.clicks.push(self.node);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.dom.lock();
        state.interactions += 1;
        state.nodes[self.node].attrs.insert("value".to_string(), String::new());
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        let mut state = self.dom.lock();
        state.interactions += 1;
        state.nodes[self.node]
            .attrs
            .entry("value".to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }
}

#[async_trait]
impl PageQuery for FakeDom {
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementRef>>> {
        self.query(Self::ROOT, selector)
    }
}

#[async_trait]
impl PageDriver for FakeDom {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        state.interactions += 1;
        if state.failing_goto {
            bail!("页面无法打开: {}", url);
        }
        state.visited.push(url.to_string());
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let mut state = self.lock();
        state.interactions += 1;
        state.reloads += 1;
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>> {
        let mut state = self.lock();
        state.interactions += 1;
        Ok(state.cookies.clone())
    }

    async fn add_cookie(&self, cookie: &StoredCookie) -> Result<()> {
        let mut state = self.lock();
        state.interactions += 1;
        if state.rejected_cookies.contains(&cookie.name) {
            bail!("Cookie 被拒绝: {}", cookie.name);
        }
        state.cookies.push(cookie.clone());
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.interactions += 1;
        state.shutdowns += 1;
        Ok(())
    }

    fn as_query(&self) -> &dyn PageQuery {
        self
    }
}

/// 每次启动都返回同一个内存 DOM
pub struct FakeLauncher {
    dom: FakeDom,
    launches: AtomicUsize,
    fail: bool,
}

impl FakeLauncher {
    pub fn new(dom: FakeDom) -> Self {
        Self {
            dom,
            launches: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(FakeDom::new())
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>> {
        if self.fail {
            bail!("浏览器无法启动");
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.dom.clone()))
    }
}

/// 收集日志输出，用于断言警告确实被记录
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let logs = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap_or_else(|e| e.into_inner())).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

type Responder = Box<dyn Fn(usize, &str) -> Result<String, LlmError> + Send + Sync>;

/// 脚本化的 LLM：按调用序号决定返回值，并记录所有请求
pub struct ScriptedCompletion {
    responder: Responder,
    calls: Mutex<Vec<(String, u32)>>,
    delay: Option<Duration>,
}

impl ScriptedCompletion {
    pub fn new(responder: impl Fn(usize, &str) -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn always(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::new(move |_, _| Ok(answer.clone()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 已发送的 (prompt, max_tokens)
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            calls.push((prompt.to_string(), max_tokens));
            calls.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(call_index, prompt)
    }
}

// ========== 页面构造辅助 ==========

/// 构造一道 Canvas 风格的选项题，返回 (容器, 各选项 input)
///
/// 选项标签通过 `label[for]` 关联
pub fn choice_question(dom: &FakeDom, id: &str, text: &str, kind: &str, options: &[&str]) -> (usize, Vec<usize>) {
    let container = dom.add(FakeDom::ROOT, "div", &[("class", "question"), ("id", id)], "");
    dom.add(container, "div", &[("class", "question_text")], text);
    let answers = dom.add(container, "div", &[("class", "answers")], "");
    let mut inputs = Vec::new();
    for (i, option) in options.iter().enumerate() {
        let row = dom.add(answers, "div", &[("class", "answer")], "");
        let input_id = format!("{}_answer_{}", id, i);
        let value = i.to_string();
        let input = dom.add(
            row,
            "input",
            &[("type", kind), ("id", &input_id), ("name", id), ("value", &value)],
            "",
        );
        dom.add(row, "label", &[("for", &input_id)], option);
        inputs.push(input);
    }
    (container, inputs)
}

/// 构造一道文本题，返回 (容器, 输入控件)
pub fn text_question(dom: &FakeDom, id: &str, text: &str, essay: bool) -> (usize, usize) {
    let container = dom.add(FakeDom::ROOT, "div", &[("class", "question"), ("id", id)], "");
    dom.add(container, "div", &[("class", "question_text")], text);
    let input_id = format!("{}_input", id);
    let input = if essay {
        dom.add(container, "textarea", &[("id", &input_id)], "")
    } else {
        dom.add(container, "input", &[("type", "text"), ("id", &input_id)], "")
    };
    (container, input)
}
