pub mod api;


use crate::app_error::AppError;
use crate::config::Config;
use crate::logger::Logger;
use crate::monitor::{estimate_cost, UsageMonitor};
use api::{extract_reply, ChatClient};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// The seam the session drives. Object safe so tests can script replies
/// without touching the network.
pub trait TextGenerator: Send + Sync {
    /// Send one prompt and return the raw reply text. `log_prefix` names the
    /// attempt for the session log files.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        log_prefix: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, AppError>> + Send + 'a>>;
}

/// Production generator: chat-completions client plus session logging and
/// usage monitoring.
pub struct LlmGenerator {
    client: ChatClient,
    logger: Arc<Logger>,
    monitor: Arc<dyn UsageMonitor>,
}

impl LlmGenerator {
    pub fn new(config: &Config, logger: Arc<Logger>, monitor: Arc<dyn UsageMonitor>) -> Self {
        Self {
            client: ChatClient::new(config),
            logger,
            monitor,
        }
    }

    async fn query(&self, prompt: &str, log_prefix: &str) -> Result<String, AppError> {
        self.logger
            .log_text(&format!("{log_prefix}-prompt.txt"), prompt)?;

        let request_body = self.client.build_request_body(prompt);
        let start_time = Instant::now();
        let response_result = self.client.query_with_retries(&request_body).await;
        let duration = start_time.elapsed();

        let response_json = match response_result {
            Ok(json) => json,
            Err(e) => {
                let error_json =
                    json!({ "error": e.to_string(), "totalResponseTime": duration.as_millis() });
                self.logger
                    .log_json(&format!("{log_prefix}-reply.json"), &error_json)?;
                return Err(e);
            }
        };

        let mut logged_response = response_json.clone();
        if let Some(obj) = logged_response.as_object_mut() {
            obj.insert("totalResponseTime".to_string(), json!(duration.as_millis()));
        } else {
            logged_response = json!({
                "response_payload": logged_response,
                "totalResponseTime": duration.as_millis(),
            });
        }
        self.logger
            .log_json(&format!("{log_prefix}-reply.json"), &logged_response)?;

        let reply = match extract_reply(&response_json) {
            Ok(reply) => reply,
            Err(e) => {
                let error_msg = format!("ERROR\n{e}");
                self.logger
                    .log_text(&format!("{log_prefix}-reply.txt"), &error_msg)?;
                return Err(e);
            }
        };
        self.logger
            .log_text(&format!("{log_prefix}-reply.txt"), &reply.text)?;

        let model = self.client.model();
        self.monitor.record_call(
            model,
            reply.usage.tokens_in,
            reply.usage.tokens_out,
            duration,
            estimate_cost(model, reply.usage.tokens_in, reply.usage.tokens_out),
        );

        Ok(reply.text)
    }
}

impl TextGenerator for LlmGenerator {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        log_prefix: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, AppError>> + Send + 'a>> {
        Box::pin(self.query(prompt, log_prefix))
    }
}
