use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use influxql_config::config::Settings;
use influxql_config::parser::ParseError;
use influxql_config::render::render;
use influxql_config::{convert, ConvertError};

/// 将 InfluxQL 查询转换为查询构建器配置 (JSON)
#[derive(Parser, Debug)]
#[command(name = "query-config")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 要转换的查询, 省略时进入交互模式
    queries: Vec<String>,

    /// 设置文件路径
    #[arg(short, long, env = "QUERY_CONFIG_SETTINGS", default_value = "query_config.json")]
    config: PathBuf,

    /// 输出格式化的 JSON
    #[arg(short, long)]
    pretty: bool,

    /// 同时输出由配置重新生成的 InfluxQL
    #[arg(short, long)]
    render: bool,

    /// 输出调试日志
    #[arg(short, long, env = "QUERY_CONFIG_DEBUG")]
    debug: bool,
}

impl Cli {
    /// 日志写到 stderr, stdout 只留给 JSON
    fn init_logging(&self) -> anyhow::Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let level = if self.debug { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()
            .context("无法初始化日志")?;

        Ok(())
    }

    /// 命令行参数优先于设置文件
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::load_or_default(&self.config)?;
        settings.pretty |= self.pretty;
        settings.render |= self.render;
        Ok(settings)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.init_logging()?;
    let settings = cli.settings()?;

    if cli.queries.is_empty() {
        return repl(&settings);
    }

    let mut failed = false;
    for query in &cli.queries {
        failed |= !convert_and_print(query, &settings)?;
    }
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// 转换一条查询并输出结果, 解析失败时返回 false
fn convert_and_print(text: &str, settings: &Settings) -> anyhow::Result<bool> {
    let config = match convert(text) {
        Ok(conversion) => conversion.into_config(),
        Err(ConvertError::Parse(err)) => {
            report_parse_error(text, &err);
            return Ok(false);
        }
    };

    let json = if settings.pretty {
        serde_json::to_string_pretty(&config)?
    } else {
        serde_json::to_string(&config)?
    };
    println!("{}", json);

    if settings.render {
        println!("{}", render(&config));
    }
    Ok(true)
}

fn report_parse_error(text: &str, err: &ParseError) {
    eprintln!("✗ 解析失败: {}", err.message);
    if let Some(span) = err.span {
        eprintln!("  位置 {}-{}", span.start, span.end);
        // 单行查询时在原文下方标出位置
        if !text.contains('\n') {
            let width = text[span.start.min(text.len())..span.end.min(text.len())].chars().count().max(1);
            let offset = text[..span.start.min(text.len())].chars().count();
            eprintln!("  {}", text);
            eprintln!("  {}{}", " ".repeat(offset), "^".repeat(width));
        }
    }
}

/// 交互模式, 读到 EOF 或 Ctrl-C 时退出
fn repl(settings: &Settings) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    if let Some(history) = &settings.history_file {
        if editor.load_history(history).is_err() {
            tracing::debug!(path = %history.display(), "no previous history");
        }
    }

    loop {
        match editor.readline(&settings.prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;
                convert_and_print(line, settings)?;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    if let Some(history) = &settings.history_file {
        editor
            .save_history(history)
            .with_context(|| format!("无法保存历史记录 {}", history.display()))?;
    }
    Ok(())
}
