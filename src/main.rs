use anyhow::Result;
use schwab_harvester::cli::{self, Command};
use schwab_harvester::utils::logging;
use schwab_harvester::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行
    let args = match cli::parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Version) => {
            println!("schwab_harvester {}", cli::version());
            return Ok(());
        }
        Ok(Command::Help) => {
            println!("{}", cli::USAGE);
            return Ok(());
        }
        Err(message) => {
            eprintln!("{}\n\n{}", message, cli::USAGE);
            std::process::exit(2);
        }
    };

    // 加载配置
    let config = Config::load(&args)?;

    // 初始化日志
    logging::init_log_file(&config.output_log_file)?;
    logging::init(config.verbose_logging, Some(config.output_log_file.as_path()))?;

    // 初始化并运行应用
    let result = App::initialize(config).await?.run().await?;

    if !result.failed.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
