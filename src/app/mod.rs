mod wiring;

use crate::{cli, context, rest, service::CarsService, storage::SqliteStorage};
use anyhow::{Context as AnyhowContext, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;

/// The main application state.
/// Built from a resolved `Context` so tests can skip CLI parsing.
pub struct App {
    ctx: context::Context,
    service: CarsService<SqliteStorage>,
    shutdown: CancellationToken,
    _log_guard: Option<WorkerGuard>,
}

impl App {
    /// Parses the CLI, initializes logging, then builds the app.
    pub fn from_cli() -> Result<App> {
        let cli = cli::parse();
        let ctx = context::Context::from_cli(&cli);

        let log_guard = crate::tracing::init(ctx.log_file.as_deref());
        let mut app = App::new(ctx)?;
        app._log_guard = log_guard;
        Ok(app)
    }

    /// Prepares the data dir and storage for `ctx`.
    fn new(ctx: context::Context) -> Result<App> {
        log_startup_info(&ctx);

        wiring::init_data_dir(&ctx).context("initializing data dir")?;
        let storage = wiring::init_storage(&ctx)?;
        let service = wiring::build_service(&ctx, storage)?;

        Ok(Self {
            ctx,
            service,
            shutdown: CancellationToken::new(),
            _log_guard: None,
        })
    }

    /// Serves the REST API until Ctrl-C or until the server task stops.
    pub async fn run_daemon(&self) -> Result<()> {
        let mut rest_handle = self.spawn_rest_server();
        self.wait_for_shutdown(&mut rest_handle).await
    }

    fn spawn_rest_server(&self) -> JoinHandle<()> {
        let addr = self.ctx.api_listen;
        let service = self.service.clone();
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            if let Err(e) = rest::serve(addr, service, token).await {
                log::error!("REST server failed: {:#}", e);
            }
        })
    }

    async fn wait_for_shutdown(&self, rest_task: &mut JoinHandle<()>) -> Result<()> {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => log::info!("🧨 Ctrl-C received, shutting down..."),
            _ = &mut *rest_task => log::error!("REST task exited unexpectedly"),
        }

        self.shutdown.cancel();

        // A finished JoinHandle must not be polled again.
        if !rest_task.is_finished() {
            let _ = rest_task.await;
        }

        log::info!("✅ Shutdown complete");
        Ok(())
    }
}

fn log_startup_info(ctx: &context::Context) {
    log::info!("🚀 Starting cars");
    log::info!("📂 Data dir: {}", ctx.data_dir.to_string_lossy());
    log::info!("🌐 REST API: http://{}", ctx.api_listen);
    if let Some(path) = ctx.log_file.as_deref() {
        log::info!("📝 Log file: {}", path.to_string_lossy());
    }
}

pub async fn run() -> Result<()> {
    let app = App::from_cli()?;
    app.run_daemon().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Car;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_context(data_dir: PathBuf, seed: bool) -> context::Context {
        context::Context {
            data_dir,
            reset: false,
            seed,
            log_file: None,
            api_listen: "127.0.0.1:0".parse().unwrap(),
        }
    }

    #[test]
    fn new_creates_data_dir_and_seeds_demo_cars() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested/data");
        let app = App::new(test_context(data_dir.clone(), true)).unwrap();

        assert!(data_dir.join("cars.sqlite").exists());
        let cars = app.service.find_all().unwrap();
        assert_eq!(cars, wiring::demo_cars());
    }

    #[test]
    fn new_without_seed_starts_empty() {
        let dir = TempDir::new().unwrap();
        let app = App::new(test_context(dir.path().to_path_buf(), false)).unwrap();
        assert!(app.service.find_all().unwrap().is_empty());
    }

    #[test]
    fn reset_drops_previous_data() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path().to_path_buf(), false);
        let app = App::new(ctx.clone()).unwrap();
        app.service
            .create(Car::new("9999ZZZ", "kept", 1999))
            .unwrap();

        let reopened = App::new(ctx.clone()).unwrap();
        assert!(reopened.service.find_by_id("9999ZZZ").unwrap().is_some());

        let reset = App::new(context::Context { reset: true, ..ctx }).unwrap();
        assert!(reset.service.find_by_id("9999ZZZ").unwrap().is_none());
    }

    #[test]
    fn seeding_twice_does_not_fail() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path().to_path_buf(), true);
        App::new(ctx.clone()).unwrap();
        let app = App::new(ctx).unwrap();
        assert_eq!(app.service.find_all().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn wait_for_shutdown_exits_when_task_finishes() {
        let dir = TempDir::new().unwrap();
        let app = App::new(test_context(dir.path().to_path_buf(), false)).unwrap();

        let mut rest_task = tokio::spawn(async {});

        let res = app.wait_for_shutdown(&mut rest_task).await;
        assert!(res.is_ok());
        assert!(app.shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn spawn_rest_server_starts_and_serves_cars() {
        let dir = TempDir::new().unwrap();
        let port = {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };
        let mut ctx = test_context(dir.path().to_path_buf(), true);
        ctx.api_listen = format!("127.0.0.1:{}", port).parse().unwrap();
        let app = App::new(ctx).unwrap();

        let handle = app.spawn_rest_server();

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        assert!(
            !handle.is_finished(),
            "REST server task finished unexpectedly (likely bind failed)"
        );

        let stream = tokio::net::TcpStream::connect(format!("127.0.0.1:{}", port)).await;
        assert!(stream.is_ok(), "Failed to connect to REST server");
        let mut stream = stream.unwrap();

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        stream
            .write_all(b"GET /cars/1111AAA HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await.unwrap();
        let response = String::from_utf8_lossy(&buffer);

        assert!(response.contains("200 OK"));
        assert!(response.contains("\"model\":\"model1\""));

        app.shutdown.cancel();
        let _ = handle.await;
    }
}
