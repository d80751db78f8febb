use std::{
    net::TcpListener,
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use tempfile::TempDir;

/// A `cars` process listening on a free local port, killed on drop.
pub struct Server {
    child: Child,
    pub base_url: String,
    _data_dir: TempDir,
}

impl Server {
    pub fn start(extra_args: &[&str]) -> Self {
        let data_dir = TempDir::new().expect("temp dir");
        let port = free_port();
        let child = Command::new(env!("CARGO_BIN_EXE_cars"))
            .arg("--data-dir")
            .arg(data_dir.path())
            .arg("--api-listen")
            .arg(format!("127.0.0.1:{port}"))
            .args(extra_args)
            .env("DOTENV_PATH", data_dir.path().join("missing.env"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn cars");

        let server = Self {
            child,
            base_url: format!("http://127.0.0.1:{port}"),
            _data_dir: data_dir,
        };
        server.wait_ready();
        server
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn wait_ready(&self) {
        let client = reqwest::blocking::Client::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send() {
                if resp.status().is_success() {
                    return;
                }
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!("cars server did not become ready at {}", self.base_url);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
    listener.local_addr().expect("probe addr").port()
}
