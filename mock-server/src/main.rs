use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let page_size = std::env::var("PAGE_SIZE")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(mock_server::DEFAULT_PAGE_SIZE);
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr} ({page_size} episodes per page)");
    mock_server::run(listener, page_size).await
}
