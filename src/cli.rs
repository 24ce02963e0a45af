//! 命令行参数
//!
//! 支持 `--flag=value` 和 `--flag value` 两种写法

use std::path::PathBuf;

pub const USAGE: &str = "\
用法: schwab_harvester [选项]

文档类型（可组合，默认 --all）:
  --all                  下载全部文档
  --transactions         证券 / EAC / DAF 交易详情
  --checks               银行账户交易详情（支票、转账）
  --docs                 对账单和税表

日期窗口（默认当前年份）:
  --year=YYYY            整年
  --date-range=YYYYMMDD-YYYYMMDD
                         显式区间，优先于 --year

其他:
  --root=<目录>          输出目录
  --config=<文件>        TOML 配置文件
  --refresh              忽略账户缓存，重新发现账户
  --port=<端口>          浏览器调试端口
  --verbose              输出调试日志
  -h, --help             显示帮助
  -v, --version          显示版本";

/// 命令行参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub all: bool,
    pub transactions: bool,
    pub checks: bool,
    pub docs: bool,
    pub year: Option<String>,
    pub date_range: Option<String>,
    pub root: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub refresh: bool,
    pub port: Option<u16>,
    pub verbose: bool,
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(CliArgs),
    Help,
    Version,
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 解析参数（不含程序名）
pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut cli = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (flag, inline_value) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };

        let mut value = |name: &str| -> Result<String, String> {
            match inline_value.clone() {
                Some(v) => Ok(v),
                None => args.next().ok_or_else(|| format!("{} 需要一个值", name)),
            }
        };

        match flag.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--version" => return Ok(Command::Version),
            "--all" => cli.all = true,
            "--transactions" => cli.transactions = true,
            "--checks" => cli.checks = true,
            "--docs" => cli.docs = true,
            "--refresh" => cli.refresh = true,
            "--verbose" => cli.verbose = true,
            "--year" => cli.year = Some(value("--year")?),
            "--date-range" => cli.date_range = Some(value("--date-range")?),
            "--root" => cli.root = Some(PathBuf::from(value("--root")?)),
            "--config" => cli.config_file = Some(PathBuf::from(value("--config")?)),
            "--port" => {
                let raw = value("--port")?;
                let port = raw
                    .parse()
                    .map_err(|_| format!("无效端口: {}", raw))?;
                cli.port = Some(port);
            }
            other => return Err(format!("未知参数: {}", other)),
        }
    }

    Ok(Command::Run(cli))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_version_and_help() {
        assert_eq!(parse(&["-v"]), Ok(Command::Version));
        assert_eq!(parse(&["--version"]), Ok(Command::Version));
        assert_eq!(parse(&["--docs", "--help"]), Ok(Command::Help));
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_both_value_styles() {
        let Ok(Command::Run(cli)) = parse(&[
            "--checks",
            "--year=2022",
            "--root",
            "/tmp/schwab",
            "--port=9333",
            "--refresh",
        ]) else {
            panic!("应解析为 Run");
        };

        assert!(cli.checks);
        assert!(!cli.docs);
        assert!(cli.refresh);
        assert_eq!(cli.year.as_deref(), Some("2022"));
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/schwab")));
        assert_eq!(cli.port, Some(9333));
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--year"]).is_err());
        assert!(parse(&["--port=abc"]).is_err());
    }

    #[test]
    fn test_no_args_runs_with_defaults() {
        assert_eq!(parse(&[]), Ok(Command::Run(CliArgs::default())));
    }
}
