use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::view::{ListRegion, StatsRegion};

/// 控制器写入内容、与用户交互的页面
#[async_trait]
pub trait Page: Send {
    fn show_files(&mut self, region: ListRegion);

    fn show_stats(&mut self, region: StatsRegion);

    /// 只更新某一行的下载次数，找不到对应行时返回false
    fn set_download_count(&mut self, token: &str, downloads: u64) -> bool;

    fn set_status(&mut self, status: &str);

    fn show_link(&mut self, url: &str);

    fn hide_link(&mut self);

    /// None表示隐藏认证提示
    fn set_auth_message(&mut self, message: Option<&str>);

    fn alert(&mut self, message: &str);

    fn confirm(&mut self, question: &str) -> bool;

    fn write_clipboard(&mut self, text: &str) -> Result<()>;

    /// 打开地址；能否观察到完成取决于具体实现
    async fn navigate(&mut self, url: &Url) -> Result<()>;
}
