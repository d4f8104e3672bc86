use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, error, info};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::time;

use crate::api::ApiClient;
use crate::config::Config;
use crate::constants::DEFAULT_WATCH_INTERVAL;
use crate::controller::ViewController;
use crate::page::{Page, TerminalPage};
use crate::view::{SortField, SortOrder, SortSelection};

#[derive(Debug, Parser)]
#[command(name = "fileshare", version, about = "FileShare 文件分享服务客户端")]
pub struct Cli {
    /// 服务器地址，覆盖 FILESHARE_URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 显示文件列表和详细统计
    Show,
    /// 显示文件列表
    List {
        #[arg(long, default_value = "name")]
        sort: SortField,
        #[arg(long, default_value = "default")]
        order: SortOrder,
    },
    /// 显示详细统计
    Stats,
    /// 上传文件
    Upload { path: Option<PathBuf> },
    /// 下载文件
    Download { token: String },
    /// 删除文件
    Delete {
        token: String,
        /// 跳过确认
        #[arg(long, short)]
        yes: bool,
    },
    /// 复制文件下载链接
    CopyLink { token: String },
    /// 定时刷新文件列表和统计，Ctrl+C退出
    Watch {
        /// 刷新间隔（秒）
        #[arg(long)]
        interval: Option<u64>,
    },
}

pub async fn bootstrap(cli: Cli) -> Result<()> {
    let mut config = Config::new()?;
    if let Some(server) = &cli.server {
        config.server_url = Config::parse_server_url(server)?;
    }
    info!("服务器: {}", config.server_url);

    let api = ApiClient::new(&config)?;
    let assume_yes = matches!(cli.command, Some(Command::Delete { yes: true, .. }));
    let page = TerminalPage::new(api.clone(), config.download_dir.clone()).assume_yes(assume_yes);
    let mut controller = ViewController::new(api, page, &config);

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => {
            controller.refresh_all().await;
            controller.check_auth_status().await;
        }
        Command::List { sort, order } => {
            // 先设置排序再刷新，列表只输出一次
            controller.set_sort(SortSelection::new(sort, order));
            controller.refresh_files_list().await;
        }
        Command::Stats => controller.refresh_detailed_stats().await,
        Command::Upload { path } => {
            controller.upload(path.as_deref()).await;
        }
        Command::Download { token } => controller.download(&token).await,
        Command::Delete { token, .. } => {
            controller.refresh_files_list().await;
            controller.delete_file(&token).await;
        }
        Command::CopyLink { token } => controller.copy_link(&token),
        Command::Watch { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or(*DEFAULT_WATCH_INTERVAL);
            info!("{}", format!("每 {} 秒刷新一次，按 Ctrl+C 退出", interval.as_secs()).green());
            watch(&mut controller, interval, async {
                match signal::ctrl_c().await {
                    Ok(()) => info!("收到终止信号，停止刷新"),
                    Err(e) => error!("无法监听Ctrl+C信号: {}", e),
                }
            })
            .await;
        }
    }

    Ok(())
}

/// 定时刷新，直到`shutdown`完成；正在进行的刷新也会被中断
pub async fn watch<P, F>(controller: &mut ViewController<P>, interval: Duration, shutdown: F)
where
    P: Page,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    tokio::select! {
        _ = controller.check_auth_status() => {}
        _ = &mut shutdown => return,
    }

    let mut ticker = time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }

        debug!("定时刷新");
        tokio::select! {
            _ = controller.refresh_all() => {}
            _ = &mut shutdown => {
                debug!("刷新被中断");
                break;
            }
        }
    }
}
