use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;

use crate::constants::DEFAULT_DATE_FORMAT;
use crate::types::millis_to_datetime;

pub const NEVER: &str = "从未";

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

// 字节数转换为可读大小，最多保留两位小数并去掉末尾的0
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit < SIZE_UNITS.len() - 1 && bytes >= divisor * 1024 {
        divisor *= 1024;
        unit += 1;
    }

    // 两位小数四舍五入，恰好在中间时进位
    let rounded = (bytes as f64 / divisor as f64 * 100.0).round() / 100.0;
    let value = format!("{:.2}", rounded);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", value, SIZE_UNITS[unit])
}

/// 日期显示设置：时区为空时使用本机时区
#[derive(Debug, Clone)]
pub struct DateDisplay {
    pub timezone: Option<Tz>,
    pub format: String,
}

impl Default for DateDisplay {
    fn default() -> Self {
        Self {
            timezone: None,
            format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DateDisplay {
    pub fn new(timezone: Option<Tz>, format: impl Into<String>) -> Self {
        Self {
            timezone,
            format: format.into(),
        }
    }

    pub fn utc() -> Self {
        Self::new(Some(Tz::UTC), DEFAULT_DATE_FORMAT)
    }

    pub fn format(&self, dt: &DateTime<Utc>) -> String {
        match self.timezone {
            Some(tz) => dt.with_timezone(&tz).format(&self.format).to_string(),
            None => dt.with_timezone(&Local).format(&self.format).to_string(),
        }
    }
}

pub fn format_date(millis: i64, display: &DateDisplay) -> String {
    match millis_to_datetime(millis) {
        Some(dt) => display.format(&dt),
        None => display.format(&DateTime::<Utc>::default()),
    }
}

pub fn format_maybe_date(millis: Option<i64>, display: &DateDisplay) -> String {
    match millis {
        Some(ms) if ms > 0 => format_date(ms, display),
        _ => NEVER.to_string(),
    }
}

pub fn format_age(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{}天 {}小时", days, hours)
    } else if hours > 0 {
        format!("{}小时 {}分钟", hours, minutes)
    } else {
        format!("{}分钟", minutes)
    }
}

/// 从Content-Disposition中取出文件名，兼容服务端对非ASCII文件名使用的 =?UTF-8?B?...?= 编码
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let raw = header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?;

    let raw = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    let raw = raw.replace("\\\"", "\"");

    let decoded = match raw
        .strip_prefix("=?UTF-8?B?")
        .and_then(|s| s.strip_suffix("?="))
    {
        Some(encoded) => {
            let bytes = STANDARD.decode(encoded).ok()?;
            String::from_utf8(bytes).ok()?
        }
        None => raw,
    };

    sanitize_filename(&decoded)
}

// 只保留最后一段路径，防止写出下载目录
pub fn sanitize_filename(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0 B")]
    #[case(1, "1 B")]
    #[case(1023, "1023 B")]
    #[case(1024, "1 KB")]
    #[case(1152, "1.13 KB")]
    #[case(1536, "1.5 KB")]
    #[case(1_049_600, "1 MB")]
    #[case(2048, "2 KB")]
    #[case(1_048_576, "1 MB")]
    #[case(1_572_864, "1.5 MB")]
    #[case(1_073_741_824, "1 GB")]
    #[case(5 * 1_099_511_627_776, "5120 GB")]
    fn test_format_file_size(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_file_size(bytes), expected);
    }

    #[test]
    fn test_format_file_size_rounds_to_two_places() {
        // 1234 / 1024 = 1.205...
        assert_eq!(format_file_size(1234), "1.21 KB");
    }

    #[test]
    fn test_format_maybe_date_never() {
        let display = DateDisplay::utc();
        assert_eq!(format_maybe_date(Some(0), &display), NEVER);
        assert_eq!(format_maybe_date(None, &display), NEVER);
        assert_eq!(format_maybe_date(Some(-5), &display), NEVER);
    }

    #[test]
    fn test_format_maybe_date_positive() {
        let display = DateDisplay::utc();
        assert_eq!(
            format_maybe_date(Some(1_700_000_000_000), &display),
            "2023/11/14 22:13:20"
        );
    }

    #[test]
    fn test_format_date_in_timezone() {
        let display = DateDisplay::new(Some(chrono_tz::Asia::Shanghai), "%Y-%m-%d %H:%M");
        assert_eq!(format_date(1_700_000_000_000, &display), "2023-11-15 06:13");
    }

    #[rstest]
    #[case(0, "0分钟")]
    #[case(59, "0分钟")]
    #[case(600, "10分钟")]
    #[case(3_700, "1小时 1分钟")]
    #[case(90_000, "1天 1小时")]
    fn test_format_age(#[case] seconds: u64, #[case] expected: &str) {
        assert_eq!(format_age(seconds), expected);
    }

    #[rstest]
    #[case("attachment; filename=\"a.txt\"", Some("a.txt"))]
    #[case("attachment; filename=report.pdf", Some("report.pdf"))]
    #[case("attachment; filename=\"=?UTF-8?B?5paH5Lu2LnR4dA==?=\"", Some("文件.txt"))]
    #[case("attachment; filename=\"../../etc/passwd\"", Some("passwd"))]
    #[case("attachment; filename=\"..\"", None)]
    #[case("inline", None)]
    fn test_filename_from_disposition(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(filename_from_disposition(header).as_deref(), expected);
    }
}
