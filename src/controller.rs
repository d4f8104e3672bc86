use log::{debug, error, info, warn};
use std::path::Path;
use std::time::Duration;

use crate::api::ApiClient;
use crate::config::Config;
use crate::page::Page;
use crate::types::{FileRecord, UploadResponse};
use crate::util::DateDisplay;
use crate::view::{render_files_list, render_stats, ListRegion, SortSelection, StatsRegion};

pub const SELECT_FILE_MESSAGE: &str = "请选择文件";
pub const UPLOADING_STATUS: &str = "上传中...";
pub const UPLOAD_DONE_STATUS: &str = "完成";
pub const UPLOAD_FAILED_STATUS: &str = "上传失败";
pub const DELETE_CONFIRM_MESSAGE: &str = "确定要删除这个文件吗？";
pub const DELETE_FAILED_MESSAGE: &str = "删除文件时出错";
pub const DOWNLOAD_FAILED_MESSAGE: &str = "下载文件时出错";
pub const LINK_COPIED_MESSAGE: &str = "链接已复制到剪贴板！";
pub const LINK_COPY_FAILED_MESSAGE: &str = "无法复制链接";
pub const AUTH_REQUIRED_MESSAGE: &str = "需要登录：请设置 FILESHARE_USERNAME 或 FILESHARE_TOKEN";

/// 控制器持有的状态：最近一次获取的文件列表和当前排序
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub files: Vec<FileRecord>,
    pub sort: SortSelection,
}

/// 保持页面上的文件列表和统计面板与服务端一致
///
/// 所有操作都不向调用方返回错误，失败会渲染到页面上并写日志。
/// 操作需要`&mut self`，同一个控制器上的动作按顺序执行。
pub struct ViewController<P: Page> {
    api: ApiClient,
    page: P,
    state: ViewState,
    dates: DateDisplay,
    settle_delay: Duration,
    last_upload_url: Option<String>,
}

impl<P: Page> ViewController<P> {
    pub fn new(api: ApiClient, page: P, config: &Config) -> Self {
        ViewController {
            api,
            page,
            state: ViewState::default(),
            dates: config.date_display.clone(),
            settle_delay: config.download_settle_delay,
            last_upload_url: None,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_dates(mut self, dates: DateDisplay) -> Self {
        self.dates = dates;
        self
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn into_page(self) -> P {
        self.page
    }

    pub async fn refresh_files_list(&mut self) {
        debug!("加载文件列表...");
        match self.api.list_files().await {
            Ok(list) => {
                self.state.files = list.files;
                self.render();
            }
            Err(e) => {
                // 显示错误而不是旧数据，旧快照只保留在内存中
                error!("加载文件列表失败: {}", e);
                self.page.show_files(ListRegion::Error);
            }
        }
    }

    pub async fn refresh_detailed_stats(&mut self) {
        debug!("加载详细统计...");
        match self.api.file_stats().await {
            Ok(stats) => self.page.show_stats(render_stats(&stats, &self.dates)),
            Err(e) => {
                error!("加载详细统计失败: {}", e);
                self.page.show_stats(StatsRegion::Error);
            }
        }
    }

    pub async fn refresh_all(&mut self) {
        self.refresh_files_list().await;
        self.refresh_detailed_stats().await;
    }

    /// 用当前快照和排序重新渲染列表
    pub fn render(&mut self) {
        let region = render_files_list(&self.state.files, self.state.sort, &self.dates);
        self.page.show_files(region);
    }

    /// 只记录排序选项，下一次渲染时生效
    pub fn set_sort(&mut self, selection: SortSelection) {
        self.state.sort = selection;
    }

    pub fn apply_sorting(&mut self, selection: SortSelection) {
        self.set_sort(selection);
        self.render();
    }

    pub async fn upload(&mut self, selection: Option<&Path>) -> Option<UploadResponse> {
        let Some(path) = selection else {
            self.page.alert(SELECT_FILE_MESSAGE);
            return None;
        };

        self.page.set_status(UPLOADING_STATUS);
        self.page.hide_link();

        let uploaded = match self.api.upload(path).await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                error!("上传失败: {} - {}", path.display(), e);
                self.page.set_status(UPLOAD_FAILED_STATUS);
                return None;
            }
        };

        self.page.set_status(UPLOAD_DONE_STATUS);
        self.page.show_link(&uploaded.url);
        self.last_upload_url = Some(uploaded.url.clone());

        self.refresh_all().await;
        Some(uploaded)
    }

    /// 复制最近一次上传返回的链接
    pub fn copy_upload_link(&mut self) {
        let Some(url) = self.last_upload_url.clone() else {
            return;
        };
        self.write_link(&url);
    }

    pub async fn download(&mut self, token: &str) {
        let url = match self.api.download_url(token) {
            Ok(url) => url,
            Err(e) => {
                error!("无法生成下载地址: {} - {}", token, e);
                self.page.alert(DOWNLOAD_FAILED_MESSAGE);
                return;
            }
        };

        if let Err(e) = self.page.navigate(&url).await {
            error!("打开下载地址失败: {} - {}", url, e);
            self.page.alert(DOWNLOAD_FAILED_MESSAGE);
        }

        // 服务端可能还没记录这次下载，延迟内未记录时计数会少1，直到下次刷新
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        self.update_download_count(token).await;
        self.refresh_all().await;
    }

    /// 只更新一行的下载计数，不重新渲染整个列表
    pub async fn update_download_count(&mut self, token: &str) -> bool {
        let list = match self.api.list_files().await {
            Ok(list) => list,
            Err(e) => {
                error!("更新下载计数失败: {}", e);
                return false;
            }
        };

        match list.files.iter().find(|file| file.token == token) {
            Some(file) => self.page.set_download_count(token, file.downloads),
            None => {
                debug!("文件列表中没有 {}", token);
                false
            }
        }
    }

    pub async fn delete_file(&mut self, token: &str) {
        if !self.page.confirm(DELETE_CONFIRM_MESSAGE) {
            return;
        }

        match self.api.delete(token).await {
            Ok(()) => {
                info!("已删除文件: {}", token);
                self.refresh_all().await;
            }
            Err(e) => {
                error!("删除文件失败: {} - {}", token, e);
                self.page.alert(DELETE_FAILED_MESSAGE);
            }
        }
    }

    pub fn copy_link(&mut self, token: &str) {
        match self.api.download_url(token) {
            Ok(url) => self.write_link(url.as_str()),
            Err(e) => {
                error!("无法生成下载地址: {} - {}", token, e);
                self.page.alert(LINK_COPY_FAILED_MESSAGE);
            }
        }
    }

    pub async fn check_auth_status(&mut self) {
        match self.api.basic_stats().await {
            Ok(_) => self.page.set_auth_message(None),
            Err(e) if e.is_unauthorized() => {
                warn!("服务端要求认证");
                self.page.set_auth_message(Some(AUTH_REQUIRED_MESSAGE));
            }
            Err(e) => {
                warn!("无法检查认证状态: {}", e);
                self.page.set_auth_message(None);
            }
        }
    }

    fn write_link(&mut self, url: &str) {
        match self.page.write_clipboard(url) {
            Ok(()) => self.page.alert(LINK_COPIED_MESSAGE),
            Err(e) => {
                warn!("复制链接失败: {}", e);
                self.page.alert(LINK_COPY_FAILED_MESSAGE);
            }
        }
    }
}
