//! Quick connectivity check against the realtime endpoint.

use tokio_tungstenite::connect_async;

#[tokio::main]
async fn main() {
    let endpoint =
        std::env::var("WS_ENDPOINT").unwrap_or_else(|_| "ws://localhost:5000/ws".to_string());
    let user_id = std::env::var("USER_ID").unwrap_or_else(|_| "1".to_string());
    let url = format!("{}?userId={}", endpoint, user_id);

    println!("Connecting to: {}", url);

    match tokio::time::timeout(std::time::Duration::from_secs(10), connect_async(&url)).await {
        Ok(Ok((_ws, response))) => {
            println!("Connected! Status: {:?}", response.status());
        }
        Ok(Err(e)) => {
            println!("Connection error: {:?}", e);
        }
        Err(_) => {
            println!("Connection timed out after 10 seconds!");
        }
    }
}
