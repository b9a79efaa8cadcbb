use super::UpstreamError;
use crate::domain_model::{MediaDetails, MediaId, MediaLimit, MediaPage, Profile};

/// Read-only pass-through to the provider's graph API. Each call selects a
/// fixed field set and narrows the response into an explicit record.
#[async_trait::async_trait]
pub trait MediaService: Send + Sync {
    async fn get_profile(&self, access_token: &str) -> Result<Profile, UpstreamError>;
    async fn get_media(
        &self,
        access_token: &str,
        limit: MediaLimit,
    ) -> Result<MediaPage, UpstreamError>;
    async fn get_media_details(
        &self,
        access_token: &str,
        id: &MediaId,
    ) -> Result<MediaDetails, UpstreamError>;
}
