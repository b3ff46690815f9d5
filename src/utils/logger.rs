use crate::core::handler::GelfHandler;
use crate::core::layer::GelfLayer;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("graylog_gelf=debug,gelf_send=debug,gelf_tail=debug,info")
        })
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("graylog_gelf=info,gelf_send=info,gelf_tail=info"))
    }
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

/// Installs console logging plus a [`GelfLayer`] shipping every event to
/// Graylog. Must be called inside a tokio runtime. The global subscriber is
/// never dropped, so the returned worker runs until the runtime shuts down.
pub fn init_gelf_logger(verbose: bool, handler: GelfHandler) -> JoinHandle<()> {
    let (layer, worker) = GelfLayer::new(handler);
    let handle = tokio::spawn(worker.run());

    // 應用程式的事件也要送出，預設不限定 target
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(layer)
        .init();

    handle
}
