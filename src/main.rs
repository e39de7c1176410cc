use anyhow::Result;
use clap::Parser;

use adserver::cli::{Cli, Commands};
use adserver::config::init_config;
use adserver::runtime::modes;
use adserver::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env 先于配置加载，供 ADS__* 变量使用
    dotenvy::dotenv().ok();
    let config = init_config(cli.config.as_deref());

    match cli.command {
        None | Some(Commands::Serve) => {
            let _guard = init_logging(&config.logging)?;
            modes::run_server().await
        }
        #[cfg(feature = "cli")]
        Some(cmd) => {
            // CLI 模式只输出警告以上的日志，避免干扰命令输出
            let mut logging = config.logging.clone();
            logging.level = "warn".to_string();
            let _guard = init_logging(&logging)?;

            if let Err(e) = modes::run_cli(cmd).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
        #[cfg(not(feature = "cli"))]
        Some(_) => anyhow::bail!("this build does not include CLI commands"),
    }
}
