use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

/// 服务端返回的单个文件元数据，时间字段均为毫秒时间戳
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub token: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub created: i64,
    // 0表示从未被下载
    #[serde(default)]
    pub last_downloaded: i64,
}

impl FileRecord {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.created)
    }

    pub fn last_downloaded_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.last_downloaded)
    }
}

pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis).single()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub total_downloads: u64,
    #[serde(default)]
    pub size_stats: Distribution,
    #[serde(default)]
    pub download_stats: Distribution,
    #[serde(default)]
    pub time_stats: TimeStats,
    #[serde(default)]
    pub format_stats: Vec<FormatStat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(default)]
    pub max: u64,
    #[serde(default)]
    pub min: u64,
    #[serde(default)]
    pub median: u64,
    #[serde(default)]
    pub average: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeStats {
    #[serde(default)]
    pub oldest: i64,
    #[serde(default)]
    pub newest: i64,
    /// 秒
    #[serde(default)]
    pub median_age: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatStat {
    pub format: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicStats {
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub total_bytes: u64,
    #[serde(default)]
    pub total_downloads: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub username: String,
}
