//! Shared harness for spinning up the HTTP API against a mock wallet and an
//! in-memory store, for black-box testing of the two payment endpoints.

use moneta_gate::{driver::Gateway, store::memory_store::MemoryStore, wallet::mock::MockWallet};
use tokio::net::TcpListener;

/// A running instance of the payment API, bound to an OS-assigned port.
pub struct TestServer {
    pub base_url: String,
    pub gateway: Gateway<MockWallet, MemoryStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Spin up a server backed by [`testing_support::mock_gateway`], with the
    /// scanning loop running.
    pub async fn spawn() -> Self {
        let gateway = testing_support::mock_gateway();
        gateway.run().await.expect("scanning loop failed to start");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("failed to read bound address");

        let served_gateway = gateway.clone();
        let handle = tokio::spawn(async move {
            moneta_gate_server::server::serve_on(listener, served_gateway)
                .await
                .expect("test server exited with an error");
        });

        Self {
            base_url: format!("http://{addr}"),
            gateway,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
