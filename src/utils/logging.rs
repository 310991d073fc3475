/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::sync::OnceLock;

use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::models::SolveReport;

static FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

fn level_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::new(format!("{}={},warn", env!("CARGO_CRATE_NAME"), level))
}

/// 初始化全局日志
///
/// `RUST_LOG` 优先；否则 `verbose` 时为 debug，平时为 info
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(verbose));
    let (filter, handle) = reload::Layer::new(filter);

    // 重复初始化（例如测试中）时忽略错误
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
    if installed.is_ok() {
        let _ = FILTER.set(handle);
    }
}

/// 配置加载完成后调整日志级别；设置了 `RUST_LOG` 时不做改动
pub fn set_verbose(verbose: bool) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    if let Some(handle) = FILTER.get() {
        if let Err(e) = handle.reload(level_filter(verbose)) {
            warn!("调整日志级别失败: {}", e);
        }
    }
}

/// 读取 `VERBOSE_LOGGING`，用于加载配置之前的日志级别
pub fn verbose_from_env() -> bool {
    std::env::var("VERBOSE_LOGGING")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(false)
}

/// 记录程序启动信息
pub fn log_startup(target_url: &str, model: &str, headless: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 测验自动作答");
    info!("🌐 目标页面: {}", target_url);
    info!("🤖 模型: {}", model);
    info!("🖥️ 无头模式: {}", headless);
    info!("{}", "=".repeat(60));
}

/// 记录作答开始信息
pub fn log_solve_start(session_id: &str, total: usize, auto_submit: bool) {
    info!("\n{}", "=".repeat(60));
    info!("📝 [会话 {}] 开始作答: 共 {} 道题", session_id, total);
    info!("📤 自动提交: {}", if auto_submit { "是" } else { "否" });
    info!("{}", "=".repeat(60));
}

/// 打印作答统计信息
pub fn print_solve_stats(report: &SolveReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 作答完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已填写: {}/{}", report.answered_questions, report.total_questions);
    info!("❌ LLM 失败: {}", report.failed_questions());
    info!("📤 已提交: {}", if report.submitted { "是" } else { "否" });
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
