use anyhow::Result;
use chrono::Local;
use env_logger::fmt::Color;
use indicatif::MultiProgress;
use log::{Level, LevelFilter};
use std::io::{self, Write};

// 全局MultiProgress实例，下载进度条和日志共用
lazy_static::lazy_static! {
    pub static ref MULTI_PROGRESS: MultiProgress = MultiProgress::new();
}

/// 日志输出前临时隐藏进度条
struct ProgressAwareWriter {
    inner: io::Stderr,
}

impl Write for ProgressAwareWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        MULTI_PROGRESS.suspend(|| self.inner.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Blue,
        Level::Trace => Color::Cyan,
    }
}

pub fn init_logger() -> Result<()> {
    env_logger::Builder::new()
        .format(|buf, record| {
            let mut style = buf.style();
            style.set_color(level_color(record.level())).set_bold(true);

            // fileshare_client::controller 只显示 controller
            let target = record
                .target()
                .strip_prefix("fileshare_client::")
                .unwrap_or(record.target());

            writeln!(
                buf,
                "[{} {} {}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                style.value(format!("{:<5}", record.level())),
                target,
                record.args()
            )
        })
        // 默认只输出警告，RUST_LOG可以覆盖
        .filter(None, LevelFilter::Warn)
        .filter_module("fileshare_client", LevelFilter::Info)
        .parse_env("RUST_LOG")
        .target(env_logger::Target::Pipe(Box::new(ProgressAwareWriter {
            inner: io::stderr(),
        })))
        .try_init()?;

    log::debug!("日志系统启动: RUST_LOG={}", std::env::var("RUST_LOG").unwrap_or_default());

    Ok(())
}

/// 在不打断进度条的情况下向标准输出打印一行
pub fn print_line(line: &str) {
    MULTI_PROGRESS.suspend(|| println!("{}", line));
}
