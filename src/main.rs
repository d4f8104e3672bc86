use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use fileshare_client::bootstrap::{bootstrap, Cli};
use fileshare_client::logger;
use log::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenv().ok();

    // 初始化日志
    logger::init_logger()?;

    let cli = Cli::parse();

    let version = env!("CARGO_PKG_VERSION");
    debug!("启动 fileshare-client {}", version);

    if let Err(e) = bootstrap(cli).await {
        error!("运行错误: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
