use reqwest::Method;
use url::Url;

use crate::config::BackendSettings;
use crate::error::BackendError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client for one Supabase project, authenticated with the service-role key.
///
/// Requests are sent once; there is no retry layer and no timeout beyond reqwest's defaults.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base: Url,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none());

        if let Some(proxy_url) = settings.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        Ok(Self::with_client(
            builder.build()?,
            settings.url.clone(),
            settings.service_key.clone(),
        ))
    }

    pub fn with_client(http: reqwest::Client, base: Url, service_key: impl Into<String>) -> Self {
        Self {
            http,
            base,
            service_key: service_key.into(),
        }
    }

    /// Appends percent-encoded `segments` to the project URL, keeping any path prefix.
    pub(super) fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(super) fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.service_key.as_str())
            .bearer_auth(&self.service_key)
    }

    pub(super) async fn execute(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, BackendError> {
        tracing::debug!(method = %request.method(), url = %request.url(), "Backend request");
        Ok(self.http.execute(request).await?)
    }
}
