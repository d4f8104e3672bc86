use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use url::Url;

use crate::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::logger::{print_line, MULTI_PROGRESS};
use crate::page::Page;
use crate::view::{
    FileRow, ListRegion, StatsRegion, EMPTY_FILES_MESSAGE, FILES_ERROR_MESSAGE, STATS_ERROR_MESSAGE,
};

/// 终端前端：区域内容直接打印，导航即下载到本地目录
pub struct TerminalPage {
    api: ApiClient,
    download_dir: PathBuf,
    assume_yes: bool,
    files: ListRegion,
}

impl TerminalPage {
    pub fn new(api: ApiClient, download_dir: PathBuf) -> Self {
        TerminalPage {
            api,
            download_dir,
            assume_yes: false,
            files: ListRegion::default(),
        }
    }

    /// 所有确认提示自动回答是
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    fn print_row(index: usize, row: &FileRow) {
        print_line(&format!("  {:<4} {}", index + 1, row.name.bold()));
        print_line(&format!(
            "       大小: {} | 下载次数: {} | 上传时间: {} | 最后下载: {}",
            row.size,
            row.downloads.to_string().cyan(),
            row.created,
            row.last_downloaded
        ));
        print_line(&format!("       令牌: {}", row.token.dimmed()));
    }

    fn progress_bar(&self) -> ProgressBar {
        let bar = MULTI_PROGRESS.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar
    }
}

#[async_trait]
impl Page for TerminalPage {
    fn show_files(&mut self, region: ListRegion) {
        print_line("");
        print_line(&format!("{}", "=== 文件列表 ===".bold()));
        match &region {
            ListRegion::Loading => print_line("加载中..."),
            ListRegion::Empty => print_line(&EMPTY_FILES_MESSAGE.dimmed().to_string()),
            ListRegion::Error => print_line(&FILES_ERROR_MESSAGE.red().to_string()),
            ListRegion::Items(rows) => {
                for (index, row) in rows.iter().enumerate() {
                    Self::print_row(index, row);
                }
                print_line(&format!("共 {} 个文件", rows.len()));
            }
        }
        self.files = region;
    }

    fn show_stats(&mut self, region: StatsRegion) {
        print_line("");
        print_line(&format!("{}", "=== 详细统计 ===".bold()));
        match region {
            StatsRegion::Loading => print_line("加载中..."),
            StatsRegion::Error => print_line(&STATS_ERROR_MESSAGE.red().to_string()),
            StatsRegion::Ready(view) => print_line(&view.to_string()),
        }
    }

    fn set_download_count(&mut self, token: &str, downloads: u64) -> bool {
        match self.files.row_mut(token) {
            Some(row) => {
                row.downloads = downloads;
                print_line(&format!("{} 的下载次数: {}", row.name, downloads.to_string().cyan()));
                true
            }
            None => false,
        }
    }

    fn set_status(&mut self, status: &str) {
        print_line(&status.bold().to_string());
    }

    fn show_link(&mut self, url: &str) {
        print_line("下载链接:");
        print_line(&format!("  {}", url.green()));
    }

    // 终端输出无法撤回
    fn hide_link(&mut self) {}

    fn set_auth_message(&mut self, message: Option<&str>) {
        if let Some(message) = message {
            print_line(&message.yellow().to_string());
        }
    }

    fn alert(&mut self, message: &str) {
        print_line(&format!("{} {}", "[提示]".yellow(), message));
    }

    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        let answer = MULTI_PROGRESS.suspend(|| {
            print!("{} [y/N]: ", question);
            let _ = io::stdout().flush();
            let mut input = String::new();
            io::stdin().read_line(&mut input).map(|_| input)
        });

        match answer {
            Ok(input) => is_yes(&input),
            Err(e) => {
                error!("读取用户输入失败: {}", e);
                false
            }
        }
    }

    // 通过OSC 52控制序列写入终端剪贴板，输出被重定向时视为失败
    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        let mut stdout = io::stdout();
        if !stdout.is_terminal() {
            return Err(ClientError::Clipboard("标准输出不是终端".to_string()));
        }

        stdout
            .write_all(osc52_sequence(text).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| ClientError::Clipboard(e.to_string()))
    }

    async fn navigate(&mut self, url: &Url) -> Result<()> {
        let bar = self.progress_bar();
        let result = self.api.download(url, &self.download_dir, &bar).await;
        if result.is_err() {
            bar.abandon();
            warn!("下载未完成: {}", url);
        }

        let path = result?;
        print_line(&format!("已保存到 {}", path.display().to_string().green()));
        Ok(())
    }
}

// 只有y/yes（不区分大小写）算同意，空输入为否
fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}
