use clap::Parser;

use shoptrack::cli::Cli;
use shoptrack::config::{StaticConfig, get_config, init_config_from};
use shoptrack::runtime::modes::{self, Mode};
use shoptrack::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(cli.config.as_deref().unwrap_or(StaticConfig::DEFAULT_PATH));

    let config = get_config();
    // guard 必须存活到进程结束，否则非阻塞日志不会刷新
    let _log_guard = init_logging(&config.logging)?;

    match modes::detect_mode(cli.command.as_ref()) {
        #[cfg(feature = "server")]
        Mode::Server => modes::run_server().await,
        #[cfg(feature = "cli")]
        Mode::Cli => {
            let Some(command) = cli.command else {
                return Ok(());
            };
            if let Err(e) = modes::run_cli(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
        Mode::Unknown => {
            eprintln!("No execution mode is enabled in this build");
            std::process::exit(1);
        }
    }
}
