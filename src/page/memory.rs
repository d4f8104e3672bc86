use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::collections::VecDeque;
use url::Url;

use crate::error::{ClientError, Result};
use crate::page::Page;
use crate::view::{ListRegion, StatsRegion};

/// 把所有区域和交互记录在内存中的页面
#[derive(Debug, Default)]
pub struct MemoryPage {
    pub files: ListRegion,
    // show_files被调用的次数
    pub files_renders: usize,
    pub stats: StatsRegion,
    pub status: Option<String>,
    pub link: Option<String>,
    pub link_visible: bool,
    pub auth_message: Option<String>,
    pub alerts: Vec<String>,
    pub prompts: Vec<String>,
    pub clipboard: Option<String>,
    pub navigations: Vec<Url>,
    pub counter_updates: Vec<(String, u64)>,

    answers: VecDeque<bool>,
    clipboard_error: Option<String>,
    // 设置后导航会真正请求该地址
    navigator: Option<Client>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预设confirm的回答，用完后一律回答否
    pub fn answer(mut self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.answers.extend(answers);
        self
    }

    pub fn failing_clipboard(mut self, reason: impl Into<String>) -> Self {
        self.clipboard_error = Some(reason.into());
        self
    }

    pub fn follow_navigations(mut self, client: Client) -> Self {
        self.navigator = Some(client);
        self
    }

    pub fn last_alert(&self) -> Option<&str> {
        self.alerts.last().map(String::as_str)
    }
}

#[async_trait]
impl Page for MemoryPage {
    fn show_files(&mut self, region: ListRegion) {
        self.files = region;
        self.files_renders += 1;
    }

    fn show_stats(&mut self, region: StatsRegion) {
        self.stats = region;
    }

    fn set_download_count(&mut self, token: &str, downloads: u64) -> bool {
        match self.files.row_mut(token) {
            Some(row) => {
                row.downloads = downloads;
                self.counter_updates.push((token.to_string(), downloads));
                true
            }
            None => false,
        }
    }

    fn set_status(&mut self, status: &str) {
        self.status = Some(status.to_string());
    }

    fn show_link(&mut self, url: &str) {
        self.link = Some(url.to_string());
        self.link_visible = true;
    }

    fn hide_link(&mut self) {
        self.link_visible = false;
    }

    fn set_auth_message(&mut self, message: Option<&str>) {
        self.auth_message = message.map(str::to_string);
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.prompts.push(question.to_string());
        self.answers.pop_front().unwrap_or(false)
    }

    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        if let Some(reason) = &self.clipboard_error {
            return Err(ClientError::Clipboard(reason.clone()));
        }
        self.clipboard = Some(text.to_string());
        Ok(())
    }

    async fn navigate(&mut self, url: &Url) -> Result<()> {
        self.navigations.push(url.clone());

        if let Some(client) = &self.navigator {
            let response = client.get(url.clone()).send().await?;
            let body = response.bytes().await?;
            debug!("导航完成: {} ({} 字节)", url, body.len());
        }
        Ok(())
    }
}
