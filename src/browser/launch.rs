use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::connection::connect_to_browser;
use crate::config::Config;
use crate::infrastructure::{CdpPage, DriverLauncher, PageDriver};

/// 启动浏览器并打开空白页面
///
/// 默认有界面（方便通过远程桌面观察），`headless = true` 时使用新版无头模式
pub async fn launch_browser(config: &Config) -> Result<CdpPage> {
    info!("🚀 启动浏览器 (无头模式: {})...", config.headless);

    let (width, height) = config.window_dimensions();
    let mut builder = BrowserConfig::builder()
        .window_size(width, height)
        .args(browser_args());
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &config.chrome_executable {
        debug!("使用自定义浏览器: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

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
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;
    info!("✅ 浏览器已就绪");

    Ok(CdpPage::new(browser, page, handler_task, true))
}

/// 额外的启动参数，窗口尺寸由 `window_size` 设置
fn browser_args() -> Vec<String> {
    vec![
        "--no-sandbox".to_string(),            // 容器内运行时需要
        "--disable-dev-shm-usage".to_string(), // 防止共享内存不足
        "--disable-blink-features=AutomationControlled".to_string(),
    ]
}

/// 按配置启动或连接浏览器
pub struct CdpLauncher {
    config: Config,
}

impl CdpLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl DriverLauncher for CdpLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>> {
        let page = match self.config.browser_debug_port {
            Some(port) => connect_to_browser(port).await?,
            None => launch_browser(&self.config).await?,
        };
        Ok(Box::new(page))
    }
}
