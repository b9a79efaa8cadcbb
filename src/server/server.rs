use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::logger::*;
use crate::server::Sweeper;
use crate::settings::Settings;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long each cached route keeps its envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTtls {
    pub profile: Duration,
    pub media: Duration,
    pub media_details: Duration,
}

/// Values the HTTP layer needs besides the services.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub frontend_redirect_url: String,
    pub secure_cookies: bool,
    pub cors_origins: Vec<String>,
    pub cache_ttls: RouteTtls,
}

pub struct Server {
    pub auth_flow: Arc<dyn AuthFlowService>,
    pub session_codec: Arc<dyn SessionCodec>,
    pub media_service: Arc<dyn MediaService>,
    pub cache: Arc<dyn ResponseCache>,
    pub rate_limiter: Arc<FixedWindowRateLimiter>,
    pub http_options: HttpOptions,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        Self::try_new_with_clock(settings, Arc::new(SystemClock)).await
    }

    pub async fn try_new_with_clock(
        settings: &Settings,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        settings.validate()?;

        let provider_config = ProviderConfig::from_settings(&settings.provider)?;

        let (token_exchange, media_service): (
            Arc<dyn TokenExchangeClient>,
            Arc<dyn MediaService>,
        ) = match settings.provider.backend.as_str() {
            "fake" => {
                warn!("provider backend is fake, serving offline data");
                (
                    Arc::new(FakeTokenExchangeClient::new()),
                    Arc::new(FakeMediaService::new()),
                )
            }
            "real" => {
                let http = provider_config.http_client()?;
                (
                    Arc::new(RealTokenExchangeClient::new(
                        http.clone(),
                        provider_config.clone(),
                    )),
                    Arc::new(RealMediaService::new(http, provider_config.clone())),
                )
            }
            other => return Err(anyhow::anyhow!("Unknown provider backend: {}", other)),
        };
        debug!(?provider_config);

        let session_codec: Arc<dyn SessionCodec> = Arc::new(JwtSessionCodec::new(
            SessionConfig {
                ttl: settings.session.ttl(),
                signing_key: settings.session.secret.clone().into_bytes(),
            },
            clock.clone(),
        ));

        let cache: Arc<dyn ResponseCache> = Arc::new(MemoryResponseCache::new(
            clock.clone(),
            settings.cache.max_entries,
        ));

        let rate_limiter = Arc::new(FixedWindowRateLimiter::new(
            settings.rate_limit.window(),
            settings.rate_limit.max_requests,
            clock.clone(),
        ));

        let auth_flow: Arc<dyn AuthFlowService> = Arc::new(RealAuthFlowService::new(
            token_exchange,
            media_service.clone(),
            session_codec.clone(),
            cache.clone(),
            provider_config,
        ));

        // region runtime infra
        let cancel = CancellationToken::new();

        let sweeper = Sweeper::new(
            cache.clone(),
            rate_limiter.clone(),
            settings.cache.sweep_interval(),
            cancel.clone(),
        );
        let sweeper_handle = tokio::spawn(async move {
            sweeper.run().await;
        });

        // endregion

        let http_options = HttpOptions {
            frontend_redirect_url: settings.frontend.redirect_url.clone(),
            secure_cookies: settings.http.cert_path.is_some() && settings.http.key_path.is_some(),
            cors_origins: settings.cors.origins.clone(),
            cache_ttls: RouteTtls {
                profile: settings.cache.profile_ttl(),
                media: settings.cache.media_ttl(),
                media_details: settings.cache.media_details_ttl(),
            },
        };

        info!(backend = %settings.provider.backend, "server started");

        Ok(Self {
            auth_flow,
            session_codec,
            media_service,
            cache,
            rate_limiter,
            http_options,
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
            cancel,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = match self.sweeper_handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }

        self.cache.invalidate_all();
    }
}
