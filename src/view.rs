//! 页面内容的纯渲染函数
//!
//! 这里的函数只依赖传入的快照和排序选项，不访问网络，也不持有状态。

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::types::{FileRecord, StatsSnapshot};
use crate::util::{format_age, format_date, format_file_size, format_maybe_date, DateDisplay};

pub const UNNAMED: &str = "未命名";
pub const EMPTY_FILES_MESSAGE: &str = "暂无已上传的文件";
pub const FILES_ERROR_MESSAGE: &str = "加载文件列表失败";
pub const STATS_ERROR_MESSAGE: &str = "加载详细统计失败";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Name,
    Size,
    Downloads,
    Created,
    LastDownloaded,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "size" => Ok(SortField::Size),
            "downloads" => Ok(SortField::Downloads),
            "date" | "created" => Ok(SortField::Created),
            "last-download" | "lastdownload" | "last-downloaded" => Ok(SortField::LastDownloaded),
            other => Err(format!("未知的排序字段: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// 保持服务端返回的顺序
    #[default]
    Default,
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(SortOrder::Default),
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("未知的排序方向: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSelection {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSelection {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    pub fn reversed(self) -> Self {
        let order = match self.order {
            SortOrder::Default => SortOrder::Default,
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        };
        Self { order, ..self }
    }
}

// 不区分大小写比较，相同时再按原文比较
fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

fn compare_by(field: SortField, a: &FileRecord, b: &FileRecord) -> Ordering {
    match field {
        SortField::Name => locale_compare(&a.name, &b.name),
        SortField::Size => a.size.cmp(&b.size),
        SortField::Downloads => a.downloads.cmp(&b.downloads),
        SortField::Created => a.created.cmp(&b.created),
        SortField::LastDownloaded => a.last_downloaded.cmp(&b.last_downloaded),
    }
}

/// 返回排序后的副本，相等元素保持原有相对顺序
pub fn sort_files(files: &[FileRecord], selection: SortSelection) -> Vec<FileRecord> {
    let mut sorted = files.to_vec();
    match selection.order {
        SortOrder::Default => {}
        SortOrder::Asc => sorted.sort_by(|a, b| compare_by(selection.field, a, b)),
        SortOrder::Desc => sorted.sort_by(|a, b| compare_by(selection.field, a, b).reverse()),
    }
    sorted
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub token: String,
    pub name: String,
    pub size: String,
    pub downloads: u64,
    pub created: String,
    pub last_downloaded: String,
}

impl FileRow {
    pub fn from_record(record: &FileRecord, dates: &DateDisplay) -> Self {
        let name = if record.name.is_empty() {
            UNNAMED.to_string()
        } else {
            record.name.clone()
        };

        FileRow {
            token: record.token.clone(),
            name,
            size: format_file_size(record.size),
            downloads: record.downloads,
            created: format_date(record.created, dates),
            last_downloaded: format_maybe_date(Some(record.last_downloaded), dates),
        }
    }
}

/// 文件列表区域
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListRegion {
    #[default]
    Loading,
    Empty,
    Error,
    Items(Vec<FileRow>),
}

impl ListRegion {
    pub fn len(&self) -> usize {
        match self {
            ListRegion::Items(rows) => rows.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> &[FileRow] {
        match self {
            ListRegion::Items(rows) => rows,
            _ => &[],
        }
    }

    pub fn row_mut(&mut self, token: &str) -> Option<&mut FileRow> {
        match self {
            ListRegion::Items(rows) => rows.iter_mut().find(|row| row.token == token),
            _ => None,
        }
    }
}

pub fn render_files_list(files: &[FileRecord], selection: SortSelection, dates: &DateDisplay) -> ListRegion {
    if files.is_empty() {
        return ListRegion::Empty;
    }

    let rows = sort_files(files, selection)
        .iter()
        .map(|record| FileRow::from_record(record, dates))
        .collect();
    ListRegion::Items(rows)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChip {
    pub format: String,
    pub count: u64,
    pub size: String,
}

/// 统计面板中已格式化的数值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub total_files: u64,
    pub total_size: String,
    pub total_downloads: u64,

    pub size_max: String,
    pub size_min: String,
    pub size_median: String,
    pub size_average: String,

    pub downloads_max: u64,
    pub downloads_min: u64,
    pub downloads_median: u64,
    pub downloads_average: u64,

    pub oldest: String,
    pub newest: String,
    pub median_age: String,

    pub formats: Vec<FormatChip>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatsRegion {
    #[default]
    Loading,
    Error,
    Ready(Box<StatsView>),
}

pub fn render_stats(stats: &StatsSnapshot, dates: &DateDisplay) -> StatsRegion {
    let view = StatsView {
        total_files: stats.total_files,
        total_size: format_file_size(stats.total_size),
        total_downloads: stats.total_downloads,

        size_max: format_file_size(stats.size_stats.max),
        size_min: format_file_size(stats.size_stats.min),
        size_median: format_file_size(stats.size_stats.median),
        size_average: format_file_size(round_non_negative(stats.size_stats.average)),

        downloads_max: stats.download_stats.max,
        downloads_min: stats.download_stats.min,
        downloads_median: stats.download_stats.median,
        downloads_average: round_non_negative(stats.download_stats.average),

        oldest: format_maybe_date(Some(stats.time_stats.oldest), dates),
        newest: format_maybe_date(Some(stats.time_stats.newest), dates),
        median_age: format_age(stats.time_stats.median_age),

        formats: stats
            .format_stats
            .iter()
            .map(|format| FormatChip {
                format: format.format.clone(),
                count: format.count,
                size: format_file_size(format.size),
            })
            .collect(),
    };

    StatsRegion::Ready(Box::new(view))
}

fn round_non_negative(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

impl fmt::Display for FileRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | 大小: {} | 下载次数: {} | 上传时间: {} | 最后下载: {}",
            self.name, self.size, self.downloads, self.created, self.last_downloaded
        )
    }
}

impl fmt::Display for StatsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "总体统计")?;
        writeln!(f, "  文件总数: {}", self.total_files)?;
        writeln!(f, "  总大小: {}", self.total_size)?;
        writeln!(f, "  总下载次数: {}", self.total_downloads)?;
        writeln!(f, "文件大小")?;
        writeln!(f, "  最大: {}", self.size_max)?;
        writeln!(f, "  最小: {}", self.size_min)?;
        writeln!(f, "  中位数: {}", self.size_median)?;
        writeln!(f, "  平均: {}", self.size_average)?;
        writeln!(f, "下载次数")?;
        writeln!(f, "  最大: {}", self.downloads_max)?;
        writeln!(f, "  最小: {}", self.downloads_min)?;
        writeln!(f, "  中位数: {}", self.downloads_median)?;
        writeln!(f, "  平均: {}", self.downloads_average)?;
        writeln!(f, "时间")?;
        writeln!(f, "  最早: {}", self.oldest)?;
        writeln!(f, "  最新: {}", self.newest)?;
        writeln!(f, "  文件年龄中位数: {}", self.median_age)?;
        write!(f, "按格式统计")?;
        for chip in &self.formats {
            write!(f, "\n  .{}: {} 个文件, {}", chip.format, chip.count, chip.size)?;
        }
        Ok(())
    }
}
