use crate::shared::infrastructure::connection::Connection;
use crate::shell::bootstrap::connect;

pub const TEST_URI: &str = "memory://local/test";

/// In-memory connection with the same plugins production uses.
pub async fn open_connection() -> Connection {
    connect(TEST_URI).await.expect("in-memory connection failed")
}
