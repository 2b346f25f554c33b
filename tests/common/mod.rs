use caption_service::config::CaptionConfig;
use caption_service::services::init_metrics;
use caption_service::services::providers::mock::MockCaptionProvider;
use caption_service::services::providers::CaptionProvider;
use caption_service::startup::Application;
use std::sync::{Arc, Once};

// Initialize metrics once for all tests in a binary
static INIT_METRICS: Once = Once::new();

pub struct TestApp {
    pub address: String,
    pub provider: Arc<MockCaptionProvider>,
}

impl TestApp {
    /// Spawn the application on a random port with the given mock provider.
    pub async fn spawn(provider: MockCaptionProvider) -> Self {
        INIT_METRICS.call_once(init_metrics);

        std::env::set_var("ENVIRONMENT", "test");
        std::env::set_var("GOOGLE_API_KEY", "test-api-key");

        let mut config = CaptionConfig::load().expect("Failed to load configuration");
        config.server.port = 0; // Random port for testing
        config.poll.interval_secs = 0; // No real waiting between polls
        config.poll.max_attempts = 5;

        let provider = Arc::new(provider);
        let app = Application::build_with_provider(
            config,
            provider.clone() as Arc<dyn CaptionProvider>,
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, provider }
    }
}
