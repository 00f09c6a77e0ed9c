//! Raw TCP servers for failure modes wiremock cannot produce

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one request that advertises `declared` bytes but sends only `sent`
/// before closing the connection. Returns the media URL.
pub async fn truncating_media_server(declared: usize, sent: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {declared}\r\nConnection: close\r\n\r\n"
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&vec![0x42; sent]).await;
            let _ = socket.shutdown().await;
        }
        // Listener drops here, later connections are refused
    });

    format!("http://{addr}/stream/cut.mp4")
}
