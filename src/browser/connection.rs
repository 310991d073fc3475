use chromiumoxide::Browser;
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::CdpPage;

/// 连接到已运行的浏览器并打开新页面
///
/// 关闭会话时只关闭该页面，不会关闭用户的浏览器
pub async fn connect_to_browser(port: u16) -> AppResult<CdpPage> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::connection_failed(port, e)
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        AppError::connection_failed(port, e)
    })?;
    debug!("已在外部浏览器中创建空白页面");

    Ok(CdpPage::new(browser, page, handler_task, false))
}
