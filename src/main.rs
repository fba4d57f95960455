use std::path::Path;

use anyhow::Result;
use proposal_flow::utils::logging;
use proposal_flow::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：指定了 TOML 文件则优先使用
    let config = match std::env::var("PROPOSAL_FLOW_CONFIG") {
        Ok(path) => Config::from_toml_file(Path::new(&path)).await?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    let requirements = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if requirements.trim().is_empty() {
        anyhow::bail!("用法: proposal_flow <项目需求描述>");
    }

    // 初始化并运行应用
    App::initialize(config).await?.run(&requirements).await;

    Ok(())
}
