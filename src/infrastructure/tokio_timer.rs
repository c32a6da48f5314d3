use std::time::Duration;

use async_trait::async_trait;

use crate::application::WindowTimer;

/// Grouping windows on the tokio clock. Under `tokio::time::pause` the
/// windows run on virtual time.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioWindowTimer;

#[async_trait]
impl WindowTimer for TokioWindowTimer {
    async fn wait(&self, window: Duration) {
        tokio::time::sleep(window).await;
    }
}
