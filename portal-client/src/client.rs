use std::{fmt::Debug, hash::Hash, sync::Arc};

use reqwest::{
    header::{HeaderMap, AUTHORIZATION, WWW_AUTHENTICATE},
    RequestBuilder, Response, StatusCode,
};
use tracing::debug;
use url::Url;

use crate::{
    authentication,
    error::{error_message, APIError},
};

#[derive(Clone)]
pub struct PortalClient {
    http_client: reqwest::Client,
    api_url: Url,
    authenticator: Option<Arc<dyn authentication::AuthMethod>>,
}

impl PartialEq for PortalClient {
    fn eq(&self, other: &Self) -> bool {
        self.api_url == other.api_url
    }
}

impl Eq for PortalClient {}

impl Hash for PortalClient {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.api_url.hash(state);
    }
}

impl Debug for PortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalClient")
            .field("api_url", &self.api_url.as_str())
            .field("authenticator", &self.authenticator)
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    pub fn new(
        api_url: Url,
        authenticator: Option<Arc<dyn authentication::AuthMethod>>,
        http_headers: HeaderMap,
    ) -> Result<Self, APIError> {
        if api_url.cannot_be_a_base() {
            return Err(APIError::URLError(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        let http_client = reqwest::Client::builder()
            .default_headers(http_headers)
            .build()?;
        Ok(PortalClient {
            http_client,
            api_url,
            authenticator,
        })
    }

    /// Absolute URL of a portal route, e.g. `["chart", "nginx", "1.2.0"]`.
    pub fn url(&self, route: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .expect("Base url")
            .pop_if_empty()
            .extend(route);
        url
    }

    pub(crate) fn get(&self, route: &[&str]) -> RequestBuilder {
        self.http_client.get(self.url(route))
    }

    pub(crate) fn post(&self, route: &[&str]) -> RequestBuilder {
        self.http_client.post(self.url(route))
    }

    pub(crate) fn delete(&self, route: &[&str]) -> RequestBuilder {
        self.http_client.delete(self.url(route))
    }

    /// Sends the request, answering a single Basic auth challenge if needed.
    ///
    /// Any non success status is turned into [`APIError::ServerError`]
    /// carrying the message found in the body.
    pub(crate) async fn execute(&self, request: reqwest::Request) -> Result<Response, APIError> {
        let req_bak = request.try_clone();
        debug!(method = %request.method(), url = %request.url(), "Sending request");
        let resp = self.http_client.execute(request).await?;
        if resp.status().is_success() {
            return Ok(resp);
        }

        if resp.status() == StatusCode::UNAUTHORIZED {
            if let (Some(mut req_bak), Some(authenticator)) = (req_bak, &self.authenticator) {
                if let Some(realm) = find_realm(&resp, authenticator.method_name()) {
                    req_bak
                        .headers_mut()
                        .insert(AUTHORIZATION, authenticator.authenticate(&realm).await);
                    let resp = self.http_client.execute(req_bak).await?;
                    return check_status(resp).await;
                }
            }
        }

        check_status(resp).await
    }
}

fn find_realm(resp: &Response, method_name: &str) -> Option<String> {
    resp.headers()
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|auth_method| auth_method.to_str().ok()?.strip_prefix(method_name))
        .find_map(|auth_params| {
            auth_params
                .trim()
                .split(',')
                .filter(|s| !s.is_empty())
                .find_map(|s| Some(s.trim().strip_prefix("realm=")?.trim_matches('"')))
                .map(str::to_string)
        })
}

async fn check_status(resp: Response) -> Result<Response, APIError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(APIError::ServerError {
        status,
        message: error_message(&body),
    })
}
