//! HTTP client for the analysis service and its template library.

use lexigenius_core::{Edit, FormValues};
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::error::ServiceError;
use crate::wire::{self, AnalysisResponse, GenerateRequest};

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5001";

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Inputs for one analysis call.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub document_name: String,
    pub document: Vec<u8>,
    pub scenario: String,
    /// Values already entered in an earlier round, if any.
    pub form_values: Option<FormValues>,
}

/// Client for the `/api/*` endpoints.
pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    /// Create a client for the given service base URL.
    ///
    /// `base_url` should be like `http://localhost:5001`; trailing slashes are trimmed.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the template names offered by the library.
    pub async fn list_templates(&self) -> Result<Vec<String>, ServiceError> {
        let url = self.endpoint(&["api", "templates"])?;
        info!(url = %url, "listing templates");
        let resp = check(self.client.get(url).send().await?).await?;
        let names: Vec<String> = resp.json().await?;
        info!(count = names.len(), "listed templates");
        Ok(names)
    }

    /// Download one template document.
    pub async fn fetch_template(&self, name: &str) -> Result<Vec<u8>, ServiceError> {
        let url = self.endpoint(&["api", "templates", name])?;
        info!(url = %url, "fetching template");
        let resp = check(self.client.get(url).send().await?).await?;
        let bytes = resp.bytes().await?;
        info!(bytes = bytes.len(), "fetched template");
        Ok(bytes.to_vec())
    }

    /// Upload a document and scenario for analysis.
    ///
    /// A response carrying the `ERROR` sentinel is still returned here; it is
    /// rejected when converted with [`AnalysisResponse::into_parts`].
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResponse, ServiceError> {
        let url = self.endpoint(&["api", "analyze"])?;

        let document = Part::bytes(request.document.clone())
            .file_name(request.document_name.clone())
            .mime_str(DOCX_MIME)?;
        let mut form = Form::new()
            .part("document", document)
            .text("scenario", request.scenario.clone());
        if let Some(values) = &request.form_values {
            form = form.text("form_values", serde_json::to_string(&wire::wire_values(values))?);
        }

        info!(url = %url, document = %request.document_name, bytes = request.document.len(), "requesting analysis");
        let resp = check(self.client.post(url).multipart(form).send().await?).await?;
        let analysis: AnalysisResponse = resp.json().await?;
        info!(
            clauses = analysis.original_doc.len(),
            suggestions = analysis.suggestions.len(),
            "analysis received"
        );
        Ok(analysis)
    }

    /// Ask the generation service to render the final document.
    pub async fn generate<'a>(
        &self,
        values: &FormValues,
        accepted: impl IntoIterator<Item = &'a Edit>,
        filename: &str,
    ) -> Result<Vec<u8>, ServiceError> {
        let url = self.endpoint(&["api", "generate"])?;
        let body = GenerateRequest::new(values, accepted, filename);

        info!(url = %url, edits = body.accepted_suggestions.len(), "requesting document generation");
        let resp = check(self.client.post(url).json(&body).send().await?).await?;
        let bytes = resp.bytes().await?;
        info!(bytes = bytes.len(), "document generated");
        Ok(bytes.to_vec())
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ServiceError::Url(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::Url(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turn a non-success status into [`ServiceError::Server`].
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ServiceError::Server {
        status: status.as_u16(),
        message: wire::server_message(&body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexigenius_core::FormValue;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Serve one canned response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{addr}"), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            if head.contains("transfer-encoding: chunked") {
                if buf.ends_with(b"0\r\n\r\n") {
                    break;
                }
                continue;
            }
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ServiceClient::new("http://localhost:5001/");
        assert_eq!(client.base_url(), "http://localhost:5001");
    }

    #[test]
    fn endpoint_encodes_segments() {
        let client = ServiceClient::new("http://localhost:5001/lexi/");
        let url = client.endpoint(&["api", "templates", "Lease Agreement.docx"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/lexi/api/templates/Lease%20Agreement.docx");
    }

    #[test]
    fn endpoint_rejects_bad_base() {
        let client = ServiceClient::new("not a url");
        assert!(matches!(client.endpoint(&["api"]), Err(ServiceError::Url(_))));
    }

    #[tokio::test]
    async fn list_templates_decodes_names() {
        let (base, server) = serve_once("200 OK", r#"["Lease.docx", "NDA.docx"]"#).await;
        let names = ServiceClient::new(base).list_templates().await.unwrap();
        assert_eq!(names, ["Lease.docx", "NDA.docx"]);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/templates HTTP/1.1"), "{request}");
    }

    #[tokio::test]
    async fn fetch_template_requests_encoded_name() {
        let (base, server) = serve_once("200 OK", "PK-bytes").await;
        let bytes = ServiceClient::new(base)
            .fetch_template("Lease Agreement.docx")
            .await
            .unwrap();
        assert_eq!(bytes, b"PK-bytes");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/templates/Lease%20Agreement.docx "), "{request}");
    }

    #[tokio::test]
    async fn analyze_posts_document_and_scenario() {
        let body = r#"{"originalDoc": [{"clause_id": "clause_001", "text": "[A]"}], "suggestions": []}"#;
        let (base, server) = serve_once("200 OK", body).await;
        let request = AnalyzeRequest {
            document_name: "lease.docx".into(),
            document: b"docx".to_vec(),
            scenario: "Ten month lease".into(),
            form_values: None,
        };
        let analysis = ServiceClient::new(base).analyze(&request).await.unwrap();
        let (clauses, edits) = analysis.into_parts().unwrap();
        assert_eq!(clauses[0].id, "clause_001");
        assert!(edits.is_empty());

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/analyze "), "{raw}");
        assert!(raw.contains(r#"name="scenario""#));
        assert!(raw.contains("Ten month lease"));
        assert!(raw.contains(r#"filename="lease.docx""#));
        assert!(!raw.contains("form_values"));
    }

    #[tokio::test]
    async fn analyze_sends_previous_values() {
        let (base, server) = serve_once("200 OK", r#"{"originalDoc": [], "suggestions": []}"#).await;
        let mut values = FormValues::new();
        values.insert("Rent Amount".into(), FormValue::text("5000"));
        values.insert("Tenant".into(), FormValue::text(""));
        let request = AnalyzeRequest {
            document_name: "lease.docx".into(),
            document: b"docx".to_vec(),
            scenario: "Ten month lease".into(),
            form_values: Some(values),
        };
        ServiceClient::new(base).analyze(&request).await.unwrap();

        let raw = server.await.unwrap();
        assert!(raw.contains(r#"name="form_values""#), "{raw}");
        assert!(raw.contains(r#"{"Rent Amount":"5000"}"#), "{raw}");
    }

    #[tokio::test]
    async fn generate_posts_values_and_accepted_edits() {
        let (base, server) = serve_once("200 OK", "PK-generated").await;
        let mut values = FormValues::new();
        values.insert("Start Date".into(), FormValue::parse_date("2025-01-05").unwrap());
        let edit = Edit::Remove {
            target_clause_id: "clause_002".into(),
            original_text: "No subletting.".into(),
            rationale: "Allowed".into(),
        };
        let bytes = ServiceClient::new(base)
            .generate(&values, [&edit], "Lease.docx")
            .await
            .unwrap();
        assert_eq!(bytes, b"PK-generated");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/generate "), "{raw}");
        let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["form_values"]["Start Date"], "January 5, 2025");
        assert_eq!(json["accepted_suggestions"][0]["action"], "REMOVE");
        assert_eq!(json["accepted_suggestions"][0]["clause_id"], "clause_002");
        assert_eq!(json["filename"], "Lease.docx");
    }

    #[tokio::test]
    async fn server_error_surfaces_message() {
        let (base, _server) = serve_once("400 Bad Request", r#"{"error": "No scenario text provided"}"#).await;
        let err = ServiceClient::new(base).list_templates().await.unwrap_err();
        match err {
            ServiceError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No scenario text provided");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }
}
