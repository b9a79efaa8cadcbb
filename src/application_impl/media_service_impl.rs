use super::ProviderConfig;
use super::provider_http::read_json;
use crate::application_port::{MediaService, UpstreamError};
use crate::domain_model::{MediaDetails, MediaId, MediaLimit, MediaPage, Profile};

pub const PROFILE_FIELDS: &str = "id,username,account_type,media_count";
pub const MEDIA_FIELDS: &str =
    "id,caption,media_type,media_url,thumbnail_url,permalink,timestamp,username";
pub const MEDIA_DETAIL_FIELDS: &str = "id,caption,media_type,media_url,thumbnail_url,permalink,timestamp,username,children{media_url,media_type,thumbnail_url}";

pub struct RealMediaService {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl RealMediaService {
    pub fn new(http: reqwest::Client, config: ProviderConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait::async_trait]
impl MediaService for RealMediaService {
    async fn get_profile(&self, access_token: &str) -> Result<Profile, UpstreamError> {
        let sent = self
            .http
            .get(self.config.graph_endpoint("me"))
            .query(&[("fields", PROFILE_FIELDS), ("access_token", access_token)])
            .send()
            .await;
        read_json("get_profile", sent).await
    }

    async fn get_media(
        &self,
        access_token: &str,
        limit: MediaLimit,
    ) -> Result<MediaPage, UpstreamError> {
        let limit = limit.get().to_string();
        let sent = self
            .http
            .get(self.config.graph_endpoint("me/media"))
            .query(&[
                ("fields", MEDIA_FIELDS),
                ("limit", limit.as_str()),
                ("access_token", access_token),
            ])
            .send()
            .await;
        read_json("get_media", sent).await
    }

    async fn get_media_details(
        &self,
        access_token: &str,
        id: &MediaId,
    ) -> Result<MediaDetails, UpstreamError> {
        let sent = self
            .http
            .get(self.config.graph_endpoint(id.as_str()))
            .query(&[("fields", MEDIA_DETAIL_FIELDS), ("access_token", access_token)])
            .send()
            .await;
        read_json("get_media_details", sent).await
    }
}
