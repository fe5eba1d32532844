use crate::error::{Error, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::responses::{
        CreateResponseArgs, EasyInputMessageArgs, InputItem, InputParam, OutputItem,
        OutputMessageContent, Role,
    },
};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 800;
const CHANNEL_IDEA_COUNT: usize = 5;

/// Anything that can turn a ranked category list into channel-idea text.
pub trait IdeaSource {
    async fn generate_ideas(&self, categories: &[String]) -> Result<String>;
}

/// Renders the generation prompt for the ranked categories.
pub fn build_prompt(categories: &[String]) -> String {
    format!(
        "Top trending YouTube categories right now: {}.\n\
         Reflecting these trends, propose {CHANNEL_IDEA_COUNT} new YouTube channel ideas. \
         For each idea give the channel name, a short description, and the first 3 content topics. \
         Write every idea in Korean and English side by side.",
        categories.join(", ")
    )
}

#[derive(Clone)]
pub struct IdeaService {
    client: Client<OpenAIConfig>,
    config: OpenAIConfig,
    http: reqwest::Client,
    model: String,
}

impl IdeaService {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::custom(format!("Failed to build HTTP client: {e}")))?;

        let config = OpenAIConfig::new().with_api_key(api_key);
        Ok(Self {
            client: Client::with_config(config.clone()).with_http_client(http.clone()),
            config,
            http,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Points the client at another OpenAI-compatible endpoint, e.g. `http://host/v1`.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.config = self.config.with_api_base(api_base.into());
        self.client = Client::with_config(self.config.clone()).with_http_client(self.http.clone());
        self
    }
}

impl IdeaSource for IdeaService {
    async fn generate_ideas(&self, categories: &[String]) -> Result<String> {
        let request = CreateResponseArgs::default()
            .model(&self.model)
            .temperature(TEMPERATURE)
            .max_output_tokens(MAX_OUTPUT_TOKENS)
            .input(InputParam::Items(vec![InputItem::EasyMessage(
                EasyInputMessageArgs::default()
                    .role(Role::User)
                    .content(build_prompt(categories))
                    .build()
                    .map_err(|e| Error::Generation(e.to_string()))?,
            )]))
            .build()
            .map_err(|e| Error::Generation(e.to_string()))?;

        let response = self
            .client
            .responses()
            .create(request)
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        let ideas = collect_output_text(response.output)?;
        info!(model = %self.model, chars = ideas.len(), "generated channel ideas");
        Ok(ideas)
    }
}

/// Concatenates the text parts of a response. No text at all is a generation failure.
fn collect_output_text(output: Vec<OutputItem>) -> Result<String> {
    let mut content = String::new();
    for item in output {
        if let OutputItem::Message(message) = item {
            for part in message.content {
                match part {
                    OutputMessageContent::OutputText(text) => content.push_str(&text.text),
                    other => warn!(?other, "ignoring non-text output"),
                }
            }
        }
    }

    if content.trim().is_empty() {
        return Err(Error::Generation("the model returned no text".to_string()));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn prompt_lists_categories_in_rank_order() {
        let categories = vec!["Music".to_string(), "Gaming".to_string(), "News".to_string()];

        let prompt = build_prompt(&categories);

        assert!(prompt.starts_with(
            "Top trending YouTube categories right now: Music, Gaming, News."
        ));
        assert!(prompt.contains("5 new YouTube channel ideas"));
        assert!(prompt.contains("first 3 content topics"));
        assert!(prompt.contains("Korean and English"));
    }

    #[test]
    fn prompt_is_pure() {
        let categories = vec!["Sports".to_string()];
        assert_eq!(build_prompt(&categories), build_prompt(&categories));
    }

    #[test]
    fn empty_output_is_a_generation_failure() {
        let err = collect_output_text(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn empty_response_output_is_a_generation_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.7,
                "max_output_tokens": 800,
                "input": [{ "type": "message", "role": "user" }]
            })))
            .and(body_string_contains(
                "Top trending YouTube categories right now: Music, Gaming.",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_0",
                "object": "response",
                "created_at": 1_700_000_000,
                "model": "gpt-4o-mini",
                "status": "completed",
                "output": [],
                "parallel_tool_calls": true,
                "tool_choice": "auto",
                "tools": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = IdeaService::new("sk-test", Duration::from_secs(5))
            .expect("service")
            .with_api_base(server.uri());
        let categories = vec!["Music".to_string(), "Gaming".to_string()];

        let err = service.generate_ideas(&categories).await.unwrap_err();

        assert!(matches!(err, Error::Generation(_)), "unexpected error: {err}");
    }
}
