mod api;
mod app;
mod domain;
mod infra;
mod shared;

pub(crate) use app::app_state;
pub(crate) use domain::{error_policy, reports};
pub(crate) use infra::{db, report_store, settings};
#[cfg(test)]
pub(crate) use infra::logs;
pub(crate) use shared::blocking;

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use app::cli::Cli;
use app_state::AppState;
use report_store::{InMemoryReportStore, ReportStore, SqliteReportStore};
use reports::{ReportEngine, ReportService};
use settings::{ReportSettings, ReportStoreKind};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl+C 监听失败: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("SIGTERM 监听失败: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("收到 Ctrl+C，开始优雅退出"),
        _ = terminate => tracing::info!("收到 SIGTERM，开始优雅退出"),
    }
}

fn build_service(db: db::Db, settings: &ReportSettings) -> ReportService {
    let store: Arc<dyn ReportStore> = match settings.report_store {
        ReportStoreKind::Memory => Arc::new(InMemoryReportStore::default()),
        ReportStoreKind::Sqlite => Arc::new(SqliteReportStore::new(db.clone())),
    };
    ReportService::new(ReportEngine::from_settings(db, settings), store)
}

async fn serve(settings: ReportSettings) -> Result<(), String> {
    let db_path = settings.db_path.clone();
    let db = blocking::run("db_init", move || db::init(Path::new(&db_path))).await?;
    let state = AppState::new(build_service(db, &settings));

    let addr = settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;
    tracing::info!(
        addr = %addr,
        store = ?settings.report_store,
        "报告服务已启动"
    );

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))?;

    tracing::info!("报告服务已停止");
    Ok(())
}

/// Entry point of the `usage-report` binary.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match settings::read(&cli.config) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("settings error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = cli.apply(&mut settings) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let _log_guard = match app::logging::init(settings.log_dir.as_deref().map(Path::new)) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("logging init error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match serve(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("报告服务异常退出: {}", err);
            ExitCode::FAILURE
        }
    }
}
