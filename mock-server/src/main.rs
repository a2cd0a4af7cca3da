//! Standalone mock server for trying requests by hand.

use tokio::net::TcpListener;

const ROUTES: &[&str] = &[
    "/get", "/int", "/post", "/put", "/patch", "/delete", "/yaml", "/empty", "/redirect",
    "/status/{code}", "/slow/{millis}", "/big/{len}", "/echo",
];

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("mock server on http://{addr}");
    for route in ROUTES {
        println!("  {route}");
    }
    mock_server::run(listener).await
}
