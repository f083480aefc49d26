//! HTTP integration tests.
//!
//! Tests the complete request flow: HTTP → routes → gateway → stub compiler.

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use bridge_api::server::{Server, ServerBuilder};
use bridge_core::ArtifactIsolation;
use bridge_test_utils::{TestDeployment, assert_scratch_clean, init_test_logging, stubs};

fn server_for(deployment: &TestDeployment) -> ServerBuilder {
    init_test_logging();
    Server::builder().http_port(5000).deploy_dir(deployment.deploy_dir())
}

fn router_with_stub(deployment: &TestDeployment, script: &str) -> axum::Router {
    let stub = deployment.install_stub(script);
    server_for(deployment)
        .compiler(stub.program, stub.args)
        .build()
        .test_router()
}

mod helpers {
    use super::*;

    pub async fn send(router: axum::Router, request: Request<Body>) -> Result<(StatusCode, Vec<u8>)> {
        let response = router.oneshot(request).await.map_err(|err| -> anyhow::Error { match err {} })?;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .context("read response body")?;
        Ok((status, body.to_vec()))
    }

    pub async fn post_raw(router: axum::Router, uri: &str, body: &[u8]) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_vec()))
            .context("build request")?;
        let (status, body) = send(router, request).await?;
        let json = serde_json::from_slice(&body).with_context(|| {
            format!(
                "parse JSON response (status={status}): {}",
                String::from_utf8_lossy(&body)
            )
        })?;
        Ok((status, json))
    }

    pub async fn post_json(router: axum::Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        let bytes = serde_json::to_vec(&body).context("serialize request body")?;
        post_raw(router, uri, &bytes).await
    }

    pub async fn get_json(router: axum::Router, uri: &str) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .context("build request")?;
        let (status, body) = send(router, request).await?;
        let json = serde_json::from_slice(&body).context("parse JSON response")?;
        Ok((status, json))
    }

    pub async fn request(router: axum::Router, method: Method, uri: &str) -> Result<(StatusCode, Vec<u8>)> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .context("build request")?;
        send(router, request).await
    }
}

// ============================================================================
// Compile
// ============================================================================

#[cfg(unix)]
mod compile {
    use super::*;

    #[tokio::test]
    async fn test_reference_sample_end_to_end() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = router_with_stub(&deployment, stubs::REFERENCE);

        let (status, json) =
            helpers::post_json(router, "/compile", json!({"code": "dhoro x = 10;"})).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["keywords"], 1);
        assert_eq!(json["identifiers"], 1);
        assert_eq!(json["assembly"], "MOV x, 10");
        assert!(json.get("error").is_none());
        assert_scratch_clean(&deployment.scratch_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_compile_error_is_http_200() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = router_with_stub(&deployment, stubs::SYNTAX_ERROR);

        let (status, json) =
            helpers::post_json(router, "/compile", json!({"code": "dhoro = ;"})).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        let error = json["error"].as_str().context("error is a string")?;
        assert!(error.starts_with("Compilation Error:\n"));
        assert_eq!(json["output"], json["error"]);
        assert_eq!(json["assembly"], "");
        assert_eq!(json["keywords"], 0);
        assert_scratch_clean(&deployment.scratch_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_counts_are_case_insensitive() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = router_with_stub(
            &deployment,
            "cat > /dev/null\necho 'keywords: 7'\necho 'Identifiers: 3'\n",
        );

        let (_, json) = helpers::post_json(router, "/compile", json!({"code": "x"})).await?;

        assert_eq!(json["keywords"], 7);
        assert_eq!(json["identifiers"], 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_compiler_reports_not_found() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = server_for(&deployment).build().test_router();

        let (status, json) =
            helpers::post_json(router, "/compile", json!({"code": "dhoro x = 10;"})).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap_or_default().contains("not found"));
        assert_scratch_clean(&deployment.scratch_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_scratch_write_failure_is_500() -> Result<()> {
        let deployment = TestDeployment::new();
        std::fs::remove_dir(deployment.scratch_dir()).context("remove scratch root")?;
        let router = router_with_stub(&deployment, stubs::REFERENCE);

        let (status, json) =
            helpers::post_json(router, "/compile", json!({"code": "dhoro x = 10;"})).await?;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
        assert_eq!(json["output"], "Server error");
        assert_eq!(json["assembly"], "");
        assert_eq!(json["keywords"], 0);
        assert_eq!(json["identifiers"], 0);
        assert!(json["error"].as_str().is_some());
        Ok(())
    }

    async fn overlapping_compiles(isolation: ArtifactIsolation) -> Result<(Value, Value, TestDeployment)> {
        let deployment = TestDeployment::new();
        let stub = deployment.install_stub(stubs::ECHO_SLOW);
        let router = server_for(&deployment)
            .compiler(stub.program, stub.args)
            .artifact_isolation(isolation)
            .build()
            .test_router();

        let (first, second) = tokio::join!(
            helpers::post_json(router.clone(), "/compile", json!({"code": "first program"})),
            helpers::post_json(router, "/compile", json!({"code": "second program"})),
        );
        let ((_, first), (_, second)) = (first?, second?);
        Ok((first, second, deployment))
    }

    #[tokio::test]
    async fn test_overlapping_compiles_per_request() -> Result<()> {
        let (first, second, deployment) = overlapping_compiles(ArtifactIsolation::PerRequest).await?;
        assert_eq!(first["assembly"], "first program");
        assert_eq!(second["assembly"], "second program");
        assert_scratch_clean(&deployment.scratch_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_overlapping_compiles_serialized() -> Result<()> {
        let (first, second, deployment) = overlapping_compiles(ArtifactIsolation::Serialized).await?;
        assert_eq!(first["assembly"], "first program");
        assert_eq!(second["assembly"], "second program");
        assert_scratch_clean(&deployment.scratch_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_overlapping_compiles_shared_complete() -> Result<()> {
        let (first, second, deployment) = overlapping_compiles(ArtifactIsolation::Shared).await?;
        assert_eq!(first["success"], true);
        assert_eq!(second["success"], true);
        assert_scratch_clean(&deployment.scratch_dir());
        Ok(())
    }
}

// ============================================================================
// Request Validation
// ============================================================================

mod validation {
    use super::*;

    #[tokio::test]
    async fn test_malformed_json_is_400() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = server_for(&deployment).build().test_router();

        let (status, json) = helpers::post_raw(router, "/compile", b"{\"code\": ").await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"success": false, "error": "Invalid JSON"}));
        assert_scratch_clean(&deployment.scratch_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_well_formed_json_without_string_code_is_200_failure() -> Result<()> {
        let deployment = TestDeployment::new();
        // A compiler is present, so any subprocess would leave a trace.
        deployment.install_placeholder_compiler();

        for body in [
            &br#"{"code": 10}"#[..],
            br#"{"code": false}"#,
            b"[]",
            br#""x""#,
            b"null",
        ] {
            let router = server_for(&deployment).build().test_router();
            let (status, json) = helpers::post_raw(router, "/compile", body).await?;

            assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(body));
            assert_eq!(json["success"], false);
            assert_eq!(json["error"], "No code provided");
        }
        assert_scratch_clean(&deployment.scratch_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_code_variants_are_200_failures() -> Result<()> {
        let deployment = TestDeployment::new();
        // A compiler is present, so any subprocess would leave a trace.
        deployment.install_placeholder_compiler();

        for body in [json!({}), json!({"code": null}), json!({"code": ""}), json!({"code": "  \n"})] {
            let router = server_for(&deployment).build().test_router();
            let (status, json) = helpers::post_json(router, "/compile", body).await?;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["success"], false);
            assert_eq!(json["error"], "No code provided");
            assert_eq!(json["output"], "Error: No code provided");
            assert_eq!(json["keywords"], 0);
            assert_eq!(json["identifiers"], 0);
        }
        assert_scratch_clean(&deployment.scratch_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = server_for(&deployment).max_body_bytes(64).build().test_router();

        let code = "x".repeat(256);
        let body = serde_json::to_vec(&json!({ "code": code }))?;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/compile")
            .body(Body::from(body))
            .context("build request")?;
        let (status, _) = helpers::send(router, request).await?;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        Ok(())
    }
}

// ============================================================================
// Health, Banner, Routing
// ============================================================================

mod status {
    use super::*;

    #[tokio::test]
    async fn test_health_tracks_compiler_presence() -> Result<()> {
        let deployment = TestDeployment::new();
        let server = server_for(&deployment).build();

        let (_, json) = helpers::get_json(server.test_router(), "/health").await?;
        assert_eq!(json["status"], "OK");
        assert_eq!(json["port"], 5000);
        assert_eq!(json["compilerExists"], false);

        deployment.install_placeholder_compiler();
        let (_, json) = helpers::get_json(server.test_router(), "/health").await?;
        assert_eq!(json["compilerExists"], true);

        deployment.remove_compiler();
        let (_, json) = helpers::get_json(server.test_router(), "/health").await?;
        assert_eq!(json["compilerExists"], false);
        Ok(())
    }

    #[tokio::test]
    async fn test_health_accepts_post() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = server_for(&deployment).build().test_router();

        let (status, _) = helpers::request(router, Method::POST, "/health").await?;
        assert_eq!(status, StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_path_is_plain_404() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = server_for(&deployment).build().test_router();

        let (status, body) = helpers::request(router, Method::GET, "/nope").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Not Found");
        Ok(())
    }

    #[tokio::test]
    async fn test_get_compile_is_404() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = server_for(&deployment).build().test_router();

        let (status, body) = helpers::request(router, Method::GET, "/compile").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Not Found");
        Ok(())
    }

    #[tokio::test]
    async fn test_metrics_endpoint_when_enabled() -> Result<()> {
        let deployment = TestDeployment::new();
        let server = server_for(&deployment).metrics_enabled(true).build();
        bridge_api::metrics::init_metrics();

        let (status, _) = helpers::request(server.test_router(), Method::GET, "/health").await?;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = helpers::request(server.test_router(), Method::GET, "/metrics").await?;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("bridge_http_requests_total"));
        Ok(())
    }
}

// ============================================================================
// CORS
// ============================================================================

mod cors {
    use super::*;

    #[tokio::test]
    async fn test_plain_options_is_empty_200() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = server_for(&deployment).build().test_router();

        let (status, body) = helpers::request(router, Method::OPTIONS, "/compile").await?;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_cors_preflight_request() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = server_for(&deployment).build().test_router();

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/compile")
            .header(header::ORIGIN, "http://localhost:8080")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .context("build request")?;
        let response = router.oneshot(request).await.map_err(|err| -> anyhow::Error { match err {} })?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .context("allow-origin header")?,
            "*"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_cors_headers_on_error_response() -> Result<()> {
        let deployment = TestDeployment::new();
        let router = server_for(&deployment).build().test_router();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/compile")
            .header(header::ORIGIN, "http://localhost:8080")
            .body(Body::from("nope"))
            .context("build request")?;
        let response = router.oneshot(request).await.map_err(|err| -> anyhow::Error { match err {} })?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        Ok(())
    }
}
