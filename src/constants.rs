use lazy_static::lazy_static;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

// 服务端接口路径
pub const FILES_PATH: &str = "/api/files";
pub const FILE_STATS_PATH: &str = "/api/file-stats";
pub const BASIC_STATS_PATH: &str = "/api/stats";
pub const UPLOAD_PATH: &str = "/api/upload";
pub const DELETE_PATH: &str = "/api/delete";
pub const AUTH_PATH: &str = "/api/auth";
pub const DOWNLOAD_PATH: &str = "/d";

// multipart中文件字段名
pub const UPLOAD_FIELD: &str = "file";

lazy_static! {
    pub static ref DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub static ref DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
    pub static ref DEFAULT_DOWNLOAD_SETTLE_DELAY: Duration = Duration::from_millis(1000);
    pub static ref DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(30);
}
