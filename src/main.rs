use anyhow::Result;
use quiz_autofill::app::{load_config, App};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志并加载配置
    let config = load_config("config.toml");

    // 初始化并运行应用
    App::initialize(config).run().await?;

    Ok(())
}
