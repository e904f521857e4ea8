use reqwest::Client;
use std::time::Duration;

/// Shared client construction for the outbound services.
/// No timeout unless one is configured.
pub fn build_client(timeout_seconds: Option<u64>, user_agent: Option<&str>) -> reqwest::Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent.to_string());
    }
    builder.build()
}
