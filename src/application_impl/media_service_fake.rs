use super::FAKE_USER_ID;
use crate::application_port::{MediaService, UpstreamError};
use crate::domain_model::*;
use chrono::{Duration, SecondsFormat, Utc};

const FAKE_USERNAME: &str = "demo_user";
const FAKE_MEDIA_COUNT: u32 = 12;

/// Offline stand-in for the graph API. Serves a fixed profile and a
/// generated feed to any token minted by the fake token exchange.
#[derive(Debug, Default)]
pub struct FakeMediaService;

impl FakeMediaService {
    pub fn new() -> Self {
        Self
    }

    fn check_token(operation: &'static str, access_token: &str) -> Result<(), UpstreamError> {
        if access_token.starts_with("fake-long-token:") {
            Ok(())
        } else {
            Err(UpstreamError::with_status(
                operation,
                400,
                "Invalid OAuth access token.",
            ))
        }
    }
}

#[async_trait::async_trait]
impl MediaService for FakeMediaService {
    async fn get_profile(&self, access_token: &str) -> Result<Profile, UpstreamError> {
        Self::check_token("get_profile", access_token)?;
        Ok(Profile {
            id: FAKE_USER_ID.to_string(),
            username: FAKE_USERNAME.to_string(),
            account_type: Some("PERSONAL".to_string()),
            media_count: Some(FAKE_MEDIA_COUNT as u64),
        })
    }

    async fn get_media(
        &self,
        access_token: &str,
        limit: MediaLimit,
    ) -> Result<MediaPage, UpstreamError> {
        Self::check_token("get_media", access_token)?;
        let count = limit.get().min(FAKE_MEDIA_COUNT);
        Ok(MediaPage {
            data: (1..=count).map(fake_media).collect(),
            paging: Some(Paging {
                cursors: Some(Cursors {
                    before: Some("fake_cursor_1".to_string()),
                    after: Some(format!("fake_cursor_{}", count)),
                }),
                next: None,
                previous: None,
            }),
        })
    }

    async fn get_media_details(
        &self,
        access_token: &str,
        id: &MediaId,
    ) -> Result<MediaDetails, UpstreamError> {
        Self::check_token("get_media_details", access_token)?;
        let index = id
            .as_str()
            .strip_prefix("fake_media_")
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|n| (1..=FAKE_MEDIA_COUNT).contains(n))
            .ok_or_else(|| {
                UpstreamError::with_status(
                    "get_media_details",
                    404,
                    format!("Object with ID '{}' does not exist", id),
                )
            })?;

        let media = fake_media(index);
        let children = (media.media_type == MediaType::CarouselAlbum).then(|| MediaChildren {
            data: (1..=3)
                .map(|n| MediaChild {
                    id: Some(format!("fake_media_{}_{}", index, n)),
                    media_type: MediaType::Image,
                    media_url: Some(format!("https://picsum.photos/800/800?random={}{}", index, n)),
                    thumbnail_url: None,
                })
                .collect(),
        });
        Ok(MediaDetails { media, children })
    }
}

fn fake_media(index: u32) -> Media {
    let media_type = match index % 4 {
        0 => MediaType::CarouselAlbum,
        3 => MediaType::Video,
        _ => MediaType::Image,
    };
    let timestamp = Utc::now() - Duration::hours(i64::from(index) * 6);
    Media {
        id: format!("fake_media_{}", index),
        caption: Some(format!("Offline post #{}", index)),
        media_type,
        media_url: Some(format!("https://picsum.photos/800/800?random={}", index)),
        thumbnail_url: (media_type == MediaType::Video)
            .then(|| format!("https://picsum.photos/400/400?random={}", index)),
        permalink: Some(format!("https://www.instagram.com/p/fake{}/", index)),
        timestamp: Some(timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)),
        username: Some(FAKE_USERNAME.to_string()),
    }
}
