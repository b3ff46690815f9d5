use clap::Parser;
use graylog_gelf::core::codec::pack;
use graylog_gelf::core::ConfigProvider;
use graylog_gelf::utils::error::ErrorSeverity;
use graylog_gelf::utils::{logger, validation::Validate};
use graylog_gelf::{build_handler, CliConfig, GelfError, GelfHandler, LogRecord, TomlConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting gelf-send");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 載入並驗證傳輸設定
    let provider: Box<dyn ConfigProvider> = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(path) {
                Ok(toml_config) => Box::new(toml_config),
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            }
        }
        None => {
            if let Err(e) = config.validate() {
                fail(&e);
            }
            Box::new(config.clone())
        }
    };

    let handler = match build_handler(provider.as_ref()) {
        Ok(handler) => handler,
        Err(e) => fail(&e),
    };

    let sent = match &config.message {
        Some(message) => send_line(&handler, &config, message).await.map(|_| 1),
        None => send_stdin(&handler, &config).await,
    };

    match sent {
        Ok(count) => {
            tracing::info!("✅ Sent {} GELF message(s) via {}", count, handler.transport_name());
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

async fn send_stdin(handler: &GelfHandler, config: &CliConfig) -> graylog_gelf::Result<usize> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut count = 0;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        send_line(handler, config, &line).await?;
        count += 1;
    }
    Ok(count)
}

async fn send_line(handler: &GelfHandler, config: &CliConfig, message: &str) -> graylog_gelf::Result<()> {
    let mut record = LogRecord::new(config.logger.clone(), config.level, message);
    for (key, value) in &config.fields {
        record.extra.insert(key.clone(), value.clone());
    }

    if config.dry_run {
        let packed = pack(&handler.make_gelf(&record))?;
        println!("{}", String::from_utf8_lossy(&packed));
        return Ok(());
    }

    handler.emit(&record).await
}

fn fail(e: &GelfError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ gelf-send failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,      // 訊息被丟棄，但程序成功
        ErrorSeverity::Medium => 2,   // 網路錯誤，可重試
        ErrorSeverity::High => 1,     // 設定錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    };
    std::process::exit(exit_code);
}
