//! Reqwest-backed implementation of the game API contract.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::model::{Character, ItemStack, Position};
use crate::settings::ApiSettings;

use super::types::{ActionData, Envelope, ErrorBody, FightData, GatherData, LocationData};
use super::{ActionOutcome, FightOutcome, GameApi, GatherOutcome, MapLocation};

/// Thin wrapper around the remote game API.
///
/// Stateless beyond the configured base URL and token; all character
/// state is fetched fresh per call.
pub struct HttpGameClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl HttpGameClient {
    pub fn new(settings: &ApiSettings) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: settings.base_url.clone(),
            token: settings.token.clone(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let request = self.client.get(self.api_url(path));
        self.execute(request).await
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let request = self.client.post(self.api_url(path)).json(body);
        self.execute(request).await
    }

    async fn execute<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<R, ApiError> {
        let response = request
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Game API request failed: {}", e);
                ApiError::RequestFailed {
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(ApiError::AuthFailed);
            }
            return Err(ApiError::Status {
                code: status.as_u16(),
                message: extract_message(&text),
            });
        }

        serde_json::from_str::<Envelope<R>>(&text)
            .map(|envelope| envelope.data)
            .map_err(|e| ApiError::InvalidResponse {
                reason: format!("JSON parse error: {e}"),
            })
    }
}

/// Pull the server's message out of an error body, falling back to the
/// raw text when it is not the documented shape.
fn extract_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Serialize)]
struct MoveBody {
    x: i32,
    y: i32,
}

#[derive(Serialize)]
struct ItemBody<'a> {
    code: &'a str,
    quantity: u32,
}

#[async_trait]
impl GameApi for HttpGameClient {
    async fn characters(&self) -> Result<Vec<Character>, ApiError> {
        self.get("/my/characters").await
    }

    async fn move_to(&self, name: &str, position: Position) -> Result<ActionOutcome, ApiError> {
        let data: ActionData = self
            .post(
                &format!("/my/{name}/action/move"),
                &MoveBody {
                    x: position.x,
                    y: position.y,
                },
            )
            .await?;
        Ok(data.into())
    }

    async fn gather(&self, name: &str) -> Result<GatherOutcome, ApiError> {
        let data: GatherData = self
            .post(&format!("/my/{name}/action/gathering"), &())
            .await?;
        Ok(data.into())
    }

    async fn fight(&self, name: &str) -> Result<FightOutcome, ApiError> {
        let data: FightData = self.post(&format!("/my/{name}/action/fight"), &()).await?;
        Ok(data.into())
    }

    async fn rest(&self, name: &str) -> Result<ActionOutcome, ApiError> {
        let data: ActionData = self.post(&format!("/my/{name}/action/rest"), &()).await?;
        Ok(data.into())
    }

    async fn deposit(
        &self,
        name: &str,
        item: &str,
        quantity: u32,
    ) -> Result<ActionOutcome, ApiError> {
        let data: ActionData = self
            .post(
                &format!("/my/{name}/action/bank/deposit"),
                &ItemBody {
                    code: item,
                    quantity,
                },
            )
            .await?;
        Ok(data.into())
    }

    async fn withdraw(
        &self,
        name: &str,
        item: &str,
        quantity: u32,
    ) -> Result<ActionOutcome, ApiError> {
        let data: ActionData = self
            .post(
                &format!("/my/{name}/action/bank/withdraw"),
                &ItemBody {
                    code: item,
                    quantity,
                },
            )
            .await?;
        Ok(data.into())
    }

    async fn craft(
        &self,
        name: &str,
        item: &str,
        quantity: u32,
    ) -> Result<ActionOutcome, ApiError> {
        let data: ActionData = self
            .post(
                &format!("/my/{name}/action/crafting"),
                &ItemBody {
                    code: item,
                    quantity,
                },
            )
            .await?;
        Ok(data.into())
    }

    async fn monster_locations(&self) -> Result<Vec<MapLocation>, ApiError> {
        let data: Vec<LocationData> = self.get("/maps/monsters").await?;
        Ok(data.into_iter().map(Into::into).collect())
    }

    async fn resource_locations(&self) -> Result<Vec<MapLocation>, ApiError> {
        let data: Vec<LocationData> = self.get("/maps/resources").await?;
        Ok(data.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpGameClient {
        HttpGameClient::new(&ApiSettings {
            base_url: "https://game.example.com/".to_string(),
            token: SecretString::from("t0ken"),
        })
    }

    #[test]
    fn test_api_url_joins_without_double_slash() {
        let c = client();
        assert_eq!(
            c.api_url("/my/characters"),
            "https://game.example.com/my/characters"
        );
        assert_eq!(
            c.api_url("maps/monsters"),
            "https://game.example.com/maps/monsters"
        );
    }

    #[test]
    fn test_extract_message_prefers_structured_error() {
        let body = r#"{"error":{"message":"character in cooldown"}}"#;
        assert_eq!(extract_message(body), "character in cooldown");
        assert_eq!(extract_message("  plain text  "), "plain text");
    }
}
