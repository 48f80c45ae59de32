use std::path::Path;
use std::sync::Arc;

use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::PortalClient;
use crate::error::APIError;

/// Metadata of one chart release, as listed by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl VersionRecord {
    /// App version for display, `N/A` when the chart does not declare one.
    pub fn app_version_or_na(&self) -> &str {
        match self.app_version.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => "N/A",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChartGroup {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<VersionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReport {
    pub message: String,
    #[serde(default)]
    pub name: String,
}

const UPLOAD_DONE: &str = "Chart uploaded successfully";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chart {
    client: Arc<PortalClient>,
    name: String,
}

impl Chart {
    pub fn from_name(client: Arc<PortalClient>, name: &str) -> Self {
        Chart {
            name: name.to_string(),
            client,
        }
    }

    /// Every chart known to the portal, grouped by name.
    pub async fn list(client: &PortalClient) -> Result<Vec<ChartGroup>, APIError> {
        let req = client.get(&["charts"]).build()?;
        let resp = client.execute(req).await?;
        Ok(serde_json::from_str(&resp.text().await?)?)
    }

    pub async fn versions(&self) -> Result<Vec<VersionRecord>, APIError> {
        let req = self
            .client
            .get(&["chart", &self.name, "versions"])
            .build()?;
        let resp = self.client.execute(req).await?;
        Ok(serde_json::from_str(&resp.text().await?)?)
    }

    pub async fn delete(&self, version: &str) -> Result<(), APIError> {
        let req = self
            .client
            .delete(&["chart", &self.name, version])
            .build()?;
        self.client.execute(req).await?;
        Ok(())
    }

    pub async fn download(&self, version: &str) -> Result<Vec<u8>, APIError> {
        let req = self.client.get(&["chart", &self.name, version]).build()?;
        let resp = self.client.execute(req).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    pub fn details_url(&self, version: &str) -> Url {
        self.client.url(&["chart", &self.name, version, "details"])
    }

    pub fn download_url(&self, version: &str) -> Url {
        self.client.url(&["chart", &self.name, version])
    }

    /// Uploads a packaged chart. The portal only accepts `.tgz` archives.
    ///
    /// The portal usually answers with a redirect to its home page rather
    /// than a report, in which case a default report is returned.
    pub async fn upload(client: &PortalClient, path: &Path) -> Result<UploadReport, APIError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| n.ends_with(".tgz"))
            .ok_or_else(|| APIError::InvalidPackage(path.display().to_string()))?
            .to_string();
        let data = tokio::fs::read(path).await?;
        let form = Form::new().part("chart", Part::bytes(data).file_name(file_name.clone()));
        let req = client.post(&["charts"]).multipart(form).build()?;
        let resp = client.execute(req).await?;
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        if is_json {
            return Ok(serde_json::from_str(&resp.text().await?)?);
        }
        debug!(url = %resp.url(), "Upload answered without a report");
        Ok(UploadReport {
            message: UPLOAD_DONE.to_string(),
            name: file_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::{
        extract::{Multipart, Path as AxumPath},
        http::StatusCode,
        response::{Html, Redirect},
        routing::{delete, get, post},
        Json, Router,
    };
    use reqwest::header::HeaderMap;
    use serde_json::json;

    async fn client_for(app: Router) -> Arc<PortalClient> {
        let base = serve(app).await;
        Arc::new(PortalClient::new(base, None, HeaderMap::new()).unwrap())
    }

    #[test]
    fn version_record_wire_format() {
        let records: Vec<VersionRecord> = serde_json::from_value(json!([
            {"name": "nginx", "version": "1.2.0", "appVersion": "1.25.3", "description": "Web server"},
            {"name": "nginx", "version": "1.1.0"}
        ]))
        .unwrap();
        assert_eq!(records[0].app_version_or_na(), "1.25.3");
        assert_eq!(records[0].description, "Web server");
        assert_eq!(records[1].app_version_or_na(), "N/A");
        assert_eq!(records[1].description, "");

        let empty = VersionRecord {
            app_version: Some(String::new()),
            ..records[0].clone()
        };
        assert_eq!(empty.app_version_or_na(), "N/A");
    }

    #[tokio::test]
    async fn lists_versions() {
        let app = Router::new().route(
            "/chart/:name/versions",
            get(|AxumPath(name): AxumPath<String>| async move {
                Json(json!([
                    {"name": name, "version": "1.2.0", "appVersion": "1.25", "description": "d"},
                    {"name": name, "version": "1.1.0", "description": "d"}
                ]))
            }),
        );
        let chart = Chart::from_name(client_for(app).await, "nginx");
        let versions = chart.versions().await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].name, "nginx");
        assert_eq!(versions[1].version, "1.1.0");
    }

    #[tokio::test]
    async fn delete_failure_carries_server_text() {
        let app = Router::new().route(
            "/chart/:name/:version",
            delete(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Failed to delete chart"})),
                )
            }),
        );
        let chart = Chart::from_name(client_for(app).await, "nginx");
        let err = chart.delete("1.1.0").await.unwrap_err();
        assert_eq!(err.server_message(), Some("Failed to delete chart"));
    }

    #[tokio::test]
    async fn download_returns_package_bytes() {
        let app = Router::new().route(
            "/chart/:name/:version",
            get(|AxumPath((name, version)): AxumPath<(String, String)>| async move {
                format!("{name}-{version}")
            }),
        );
        let chart = Chart::from_name(client_for(app).await, "nginx");
        assert_eq!(chart.download("1.2.0").await.unwrap(), b"nginx-1.2.0");
    }

    #[tokio::test]
    async fn lists_chart_groups() {
        let app = Router::new().route(
            "/charts",
            get(|| async {
                Json(json!([
                    {"name": "nginx", "versions": [{"name": "nginx", "version": "1.2.0"}]},
                    {"name": "redis"}
                ]))
            }),
        );
        let client = client_for(app).await;
        let groups = Chart::list(&client).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].versions[0].version, "1.2.0");
        assert!(groups[1].versions.is_empty());
    }

    #[tokio::test]
    async fn uploads_tgz_as_chart_field() {
        let app = Router::new().route(
            "/charts",
            post(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                let field_name = field.name().unwrap().to_string();
                let file_name = field.file_name().unwrap().to_string();
                let data = field.bytes().await.unwrap();
                Json(json!({
                    "message": format!("{field_name}:{}", data.len()),
                    "name": file_name,
                }))
            }),
        );
        let client = client_for(app).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nginx-1.2.0.tgz");
        std::fs::write(&path, b"package").unwrap();

        let report = Chart::upload(&client, &path).await.unwrap();
        assert_eq!(report.message, "chart:7");
        assert_eq!(report.name, "nginx-1.2.0.tgz");
    }

    #[tokio::test]
    async fn upload_redirected_home_is_a_success() {
        let app = Router::new()
            .route("/charts", post(|| async { Redirect::to("/") }))
            .route("/", get(|| async { Html("<html><body>Charts</body></html>") }));
        let client = client_for(app).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nginx-1.2.0.tgz");
        std::fs::write(&path, b"package").unwrap();

        let report = Chart::upload(&client, &path).await.unwrap();
        assert_eq!(report.message, "Chart uploaded successfully");
        assert_eq!(report.name, "nginx-1.2.0.tgz");
    }

    #[tokio::test]
    async fn upload_failure_carries_server_error() {
        let app = Router::new().route(
            "/charts",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Failed to save chart"})),
                )
            }),
        );
        let client = client_for(app).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nginx-1.2.0.tgz");
        std::fs::write(&path, b"package").unwrap();

        let err = Chart::upload(&client, &path).await.unwrap_err();
        assert_eq!(err.server_message(), Some("Failed to save chart"));
    }

    #[tokio::test]
    async fn upload_rejects_non_tgz_before_sending() {
        let client = client_for(Router::new()).await;
        let err = Chart::upload(&client, Path::new("/tmp/values.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, APIError::InvalidPackage(_)));
    }

    #[test]
    fn links_embed_name_and_version() {
        let client = Arc::new(
            PortalClient::new(
                Url::parse("http://localhost:3030").unwrap(),
                None,
                HeaderMap::new(),
            )
            .unwrap(),
        );
        let chart = Chart::from_name(client, "nginx");
        assert_eq!(
            chart.details_url("1.1.0").as_str(),
            "http://localhost:3030/chart/nginx/1.1.0/details"
        );
        assert_eq!(
            chart.download_url("1.1.0").as_str(),
            "http://localhost:3030/chart/nginx/1.1.0"
        );
    }
}
