//! HTTP implementation of [`WorldApi`].
//!
//! Wraps `reqwest` with bearer authentication, a per-request timeout, page
//! walking for listings and a bounded retry loop for the statuses the game
//! uses to signal contention (461 transaction in progress, 486 action in
//! progress, 499 character in cooldown) as well as 5xx and transport errors.

use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;

use super::responses::{ActionResponse, BankResponse, FightResponse, SkillResponse};
use super::schema::{
    BankData, DataEnvelope, FightData, ItemRequest, ItemSchema, MapSchema, MonsterSchema,
    MoveData, MoveRequest, PagedEnvelope, ResourceSchema, SingleItemSchema, SkillData,
};
use super::{ApiError, ApiResult, ItemQuery, LocationQuery, WorldApi};
use crate::config::ApiConfig;
use crate::logutil::escape_log;
use crate::models::location::locations_to_map;
use crate::models::{
    resource, BankHoldings, Character, Coords, Item, Location, LocationKind, Monster, Resource,
    SimpleItem, Skill,
};

/// Whether a status is worth retrying after a pause
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 461 | 486 | 499) || (500..=599).contains(&status)
}

pub struct HttpWorldApi {
    config: ApiConfig,
    client: reqwest::Client,
}

impl HttpWorldApi {
    /// Create a client for the configured API
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mmoengine/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    /// Build a request URL; query values are percent-encoded
    pub fn build_url(&self, path: &str, query: &[(&str, String)]) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = format!("{}{}", base, path);
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.retry_backoff_ms;
        let jitter = if base > 1 {
            rand::thread_rng().gen_range(0..base / 2)
        } else {
            0
        };
        Duration::from_millis(base * u64::from(attempt) + jitter)
    }

    /// Send one request, retrying contention statuses, and decode the JSON body.
    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.build_url(path, query);
        let timeout_duration = Duration::from_secs(self.config.timeout_seconds);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&self.config.token)
                .header("Accept", "application/json");
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!("{} {} (attempt {})", method, url, attempt);
            let outcome = match timeout(timeout_duration, request.send()).await {
                Err(_) => Err(ApiError::Timeout(self.config.timeout_seconds)),
                Ok(Err(e)) => Err(ApiError::Http(e)),
                Ok(Ok(response)) => Ok(response),
            };

            let retryable = match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes = response.bytes().await?;
                        return serde_json::from_slice(&bytes).map_err(|e| {
                            ApiError::Decode(format!("{} {}: {}", method, path, e))
                        });
                    }
                    let text = response.text().await.unwrap_or_default();
                    if status == StatusCode::NOT_FOUND {
                        return Err(ApiError::NotFound(path.to_string()));
                    }
                    let err = ApiError::Status {
                        status: status.as_u16(),
                        body: escape_log(&text),
                    };
                    if !is_retryable_status(status.as_u16()) {
                        return Err(err);
                    }
                    err
                }
                Err(err) => err,
            };

            if attempt > self.config.max_retries {
                return Err(retryable);
            }
            let pause = self.backoff(attempt);
            warn!(
                "{} {} failed ({}), retrying in {}ms",
                method,
                path,
                retryable,
                pause.as_millis()
            );
            tokio::time::sleep(pause).await;
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        self.send::<(), T>(Method::GET, path, query, None).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        self.send(Method::POST, path, &[], body).await
    }

    /// Walk every page of a listing
    async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Vec<T>> {
        let mut out = Vec::new();
        let mut page = 1u32;
        loop {
            let mut q: Vec<(&str, String)> = query.to_vec();
            q.push(("page", page.to_string()));
            q.push(("size", self.config.page_size.to_string()));
            let envelope: PagedEnvelope<T> = self.get(path, &q).await?;
            let more = envelope.has_more();
            out.extend(envelope.data);
            if !more {
                return Ok(out);
            }
            page += 1;
        }
    }

    fn action_path(character: &str, action: &str) -> String {
        format!("/my/{}/action/{}", urlencoding::encode(character), action)
    }

    /// Resolve map locations for resources, keeping only placed ones
    async fn place_resources(&self, resources: Vec<Resource>) -> ApiResult<Vec<Resource>> {
        if resources.is_empty() {
            return Ok(resources);
        }
        let tiles = self.get_locations(&LocationQuery::kind(LocationKind::Resource)).await?;
        let placed = resource::join_locations(resources, &locations_to_map(&tiles));
        Ok(resource::dedupe(placed))
    }
}

#[async_trait]
impl WorldApi for HttpWorldApi {
    async fn get_character(&self, name: &str) -> ApiResult<Character> {
        let characters: DataEnvelope<Vec<Character>> = self.get("/my/characters", &[]).await?;
        characters
            .data
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ApiError::NotFound(format!("character {}", name)))
    }

    async fn get_bank_items(&self) -> ApiResult<BankHoldings> {
        let items: Vec<SimpleItem> = self.get_paged("/my/bank/items", &[]).await?;
        Ok(items.into_iter().collect())
    }

    async fn get_item(&self, code: &str) -> ApiResult<Item> {
        let path = format!("/items/{}", urlencoding::encode(code));
        let item: DataEnvelope<SingleItemSchema> = self.get(&path, &[]).await?;
        item.data.into_item().try_into()
    }

    async fn get_items(&self, query: &ItemQuery) -> ApiResult<Vec<Item>> {
        let mut q = Vec::new();
        if let Some(skill) = query.craft_skill {
            q.push(("craft_skill", skill.code().to_string()));
        }
        if let Some(ref material) = query.craft_material {
            q.push(("craft_material", material.clone()));
        }
        if let Some(min) = query.min_level {
            q.push(("min_level", min.to_string()));
        }
        if let Some(max) = query.max_level {
            q.push(("max_level", max.to_string()));
        }
        let items: Vec<ItemSchema> = self.get_paged("/items", &q).await?;
        items.into_iter().map(Item::try_from).collect()
    }

    async fn get_locations(&self, query: &LocationQuery) -> ApiResult<Vec<Location>> {
        let mut q = Vec::new();
        if let Some(ref kind) = query.kind {
            q.push(("content_type", kind.as_str().to_string()));
        }
        if let Some(ref code) = query.code {
            q.push(("content_code", code.clone()));
        }
        let tiles: Vec<MapSchema> = self.get_paged("/maps", &q).await?;
        Ok(tiles
            .into_iter()
            .filter_map(MapSchema::into_location)
            .filter(|l| query.matches(l))
            .collect())
    }

    async fn get_resources_by_drop(&self, code: &str) -> ApiResult<Vec<Resource>> {
        let raw: Vec<ResourceSchema> = self.get_paged("/resources", &[("drop", code.to_string())]).await?;
        let resources = raw
            .into_iter()
            .map(Resource::try_from)
            .collect::<ApiResult<Vec<_>>>()?;
        self.place_resources(resources).await
    }

    async fn get_resources_by_skill(
        &self,
        skill: Skill,
        min_level: u32,
        max_level: u32,
    ) -> ApiResult<Vec<Resource>> {
        let q = [
            ("skill", skill.code().to_string()),
            ("min_level", min_level.to_string()),
            ("max_level", max_level.to_string()),
        ];
        let raw: Vec<ResourceSchema> = self.get_paged("/resources", &q).await?;
        let resources = raw
            .into_iter()
            .map(Resource::try_from)
            .collect::<ApiResult<Vec<_>>>()?;
        self.place_resources(resources).await
    }

    async fn get_monsters(&self, min_level: u32, max_level: u32) -> ApiResult<Vec<Monster>> {
        let q = [
            ("min_level", min_level.to_string()),
            ("max_level", max_level.to_string()),
        ];
        let raw: Vec<MonsterSchema> = self.get_paged("/monsters", &q).await?;
        Ok(raw.into_iter().map(Monster::from).collect())
    }

    async fn move_to(&self, character: &str, coords: Coords) -> ApiResult<ActionResponse> {
        let body = MoveRequest {
            x: coords.x,
            y: coords.y,
        };
        let data: DataEnvelope<MoveData> = self
            .post(&Self::action_path(character, "move"), Some(&body))
            .await?;
        Ok(data.data.into())
    }

    async fn gather(&self, character: &str) -> ApiResult<SkillResponse> {
        let data: DataEnvelope<SkillData> = self
            .post::<(), _>(&Self::action_path(character, "gathering"), None)
            .await?;
        Ok(SkillResponse {
            response: ActionResponse {
                character: data.data.character,
                cooldown: data.data.cooldown,
            },
            details: data.data.details,
        })
    }

    async fn fight(&self, character: &str) -> ApiResult<FightResponse> {
        let data: DataEnvelope<FightData> = self
            .post::<(), _>(&Self::action_path(character, "fight"), None)
            .await?;
        Ok(FightResponse {
            response: ActionResponse {
                character: data.data.character,
                cooldown: data.data.cooldown,
            },
            fight: data.data.fight,
        })
    }

    async fn craft(&self, character: &str, code: &str, quantity: u32) -> ApiResult<SkillResponse> {
        let body = ItemRequest { code, quantity };
        let data: DataEnvelope<SkillData> = self
            .post(&Self::action_path(character, "crafting"), Some(&body))
            .await?;
        Ok(SkillResponse {
            response: ActionResponse {
                character: data.data.character,
                cooldown: data.data.cooldown,
            },
            details: data.data.details,
        })
    }

    async fn deposit(&self, character: &str, code: &str, quantity: u32) -> ApiResult<BankResponse> {
        let body = ItemRequest { code, quantity };
        let data: DataEnvelope<BankData> = self
            .post(&Self::action_path(character, "bank/deposit"), Some(&body))
            .await?;
        Ok(bank_response(data.data, code, quantity))
    }

    async fn withdraw(
        &self,
        character: &str,
        code: &str,
        quantity: u32,
    ) -> ApiResult<BankResponse> {
        let body = ItemRequest { code, quantity };
        let data: DataEnvelope<BankData> = self
            .post(&Self::action_path(character, "bank/withdraw"), Some(&body))
            .await?;
        Ok(bank_response(data.data, code, quantity))
    }
}

fn bank_response(data: BankData, code: &str, quantity: u32) -> BankResponse {
    let item_code = data.item.map(|i| i.code).unwrap_or_else(|| code.to_string());
    BankResponse {
        response: ActionResponse {
            character: data.character,
            cooldown: data.cooldown,
        },
        item: SimpleItem::new(item_code, quantity),
        bank: data.bank,
    }
}
