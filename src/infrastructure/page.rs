//! 页面能力接口 - 基础设施层
//!
//! 业务层只通过这些 trait 访问页面，不直接接触浏览器驱动

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use crate::models::{Selector, StoredCookie};

/// 等待元素时的轮询间隔
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 父元素快照（标签名 + 文本）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentInfo {
    pub tag_name: String,
    pub text: String,
}

/// 页面元素
#[async_trait]
pub trait ElementRef: Send + Sync {
    /// 元素的可见文本
    async fn text(&self) -> Result<String>;
    async fn attribute(&self, name: &str) -> Result<Option<String>>;
    /// 结构上的父元素，没有父元素时为 None
    async fn parent(&self) -> Result<Option<ParentInfo>>;
    /// 在元素内部（后代）按文档顺序查找
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementRef>>>;
    async fn click(&self) -> Result<()>;
    /// 清空输入控件的当前值
    async fn clear(&self) -> Result<()>;
    async fn type_text(&self, text: &str) -> Result<()>;

    async fn find_one(&self, selector: &Selector) -> Result<Option<Box<dyn ElementRef>>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }
}

/// 页面查询能力
#[async_trait]
pub trait PageQuery: Send + Sync {
    /// 在整个文档中按文档顺序查找
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementRef>>>;

    async fn find_one(&self, selector: &Selector) -> Result<Option<Box<dyn ElementRef>>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    /// 等待元素出现，超时返回 false
    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.find_one(selector).await?.is_some() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

/// 会话独占的浏览器驱动句柄
#[async_trait]
pub trait PageDriver: PageQuery {
    async fn goto(&self, url: &str) -> Result<()>;
    async fn reload(&self) -> Result<()>;
    async fn cookies(&self) -> Result<Vec<StoredCookie>>;
    async fn add_cookie(&self, cookie: &StoredCookie) -> Result<()>;
    /// 释放驱动（关闭浏览器或页面）
    async fn shutdown(&mut self) -> Result<()>;
    /// 以只读查询能力的形式借出
    fn as_query(&self) -> &dyn PageQuery;
}

/// 浏览器启动器
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageDriver>>;
}
