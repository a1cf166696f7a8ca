//! The mutating admission webhook.
//!
//! `POST /` reviews `admission.k8s.io/v1` `AdmissionReview` objects, `GET
//! /health` reports liveness and `GET /version` returns the program version.

mod error;
mod handler;
mod namespace;
mod server;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};

pub use self::{
    error::Error, handler::AdmissionState, namespace::NamespaceFilter, server::TlsServer,
};

pub fn router(state: AdmissionState) -> Router {
    Router::new()
        .route("/", post(handler::admit))
        .route("/health", get(health))
        .route("/version", get(version))
        .with_state(Arc::new(state))
}

async fn health() -> StatusCode { StatusCode::OK }

async fn version() -> &'static str { tzinject_base::PROJECT_VERSION }

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use tzinject_core::InjectionDefaults;

    use super::*;

    fn app(defaults: InjectionDefaults) -> Router {
        router(AdmissionState::new(defaults, NamespaceFilter::new(["default", "jobs"]), None))
    }

    fn review(operation: &str, namespace: &str, annotations: &Value) -> Value {
        json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "requestKind": {"group": "", "version": "v1", "kind": "Pod"},
                "requestResource": {"group": "", "version": "v1", "resource": "pods"},
                "name": "web",
                "namespace": namespace,
                "operation": operation,
                "userInfo": {"username": "admin", "uid": "0", "groups": ["system:masters"]},
                "object": {
                    "apiVersion": "v1",
                    "kind": "Pod",
                    "metadata": {"name": "web", "namespace": namespace, "annotations": annotations},
                    "spec": {"containers": [{"name": "web", "image": "nginx"}]}
                },
                "oldObject": null,
                "dryRun": false
            }
        })
    }

    async fn post_json(app: Router, content_type: &str, body: Vec<u8>) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn admission_response(app: Router, review: &Value) -> Value {
        let body = serde_json::to_vec(review).unwrap();
        let response = post_json(app, "application/json", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let review: Value = serde_json::from_slice(&body).unwrap();
        review["response"].clone()
    }

    fn has_patch(response: &Value) -> bool {
        response.get("patch").is_some_and(|patch| !patch.is_null())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(InjectionDefaults::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_version() {
        let request = Request::builder().uri("/version").body(Body::empty()).unwrap();
        let response = app(InjectionDefaults::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], tzinject_base::PROJECT_VERSION.as_bytes());
    }

    #[tokio::test]
    async fn test_get_is_not_allowed() {
        let request = Request::builder().method(Method::GET).uri("/").body(Body::empty()).unwrap();
        let response = app(InjectionDefaults::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_wrong_content_type() {
        let body = serde_json::to_vec(&review("CREATE", "default", &json!({}))).unwrap();
        let response = post_json(app(InjectionDefaults::default()), "text/plain", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let app = app(InjectionDefaults::default());
        let response = post_json(app, "application/json", b"{not json".to_vec()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_request() {
        let body = serde_json::to_vec(&json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview"
        }))
        .unwrap();
        let response = post_json(app(InjectionDefaults::default()), "application/json", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pod_create_is_patched() {
        let response = admission_response(
            app(InjectionDefaults::default()),
            &review("CREATE", "default", &json!({})),
        )
        .await;
        assert_eq!(response["uid"], "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert_eq!(response["allowed"], true);
        assert_eq!(response["patchType"], "JSONPatch");
        assert!(has_patch(&response));
    }

    #[tokio::test]
    async fn test_opted_out_pod_is_allowed_unchanged() {
        let annotations = json!({"timezone.tzinject.io/inject": "false"});
        let response = admission_response(
            app(InjectionDefaults::default()),
            &review("CREATE", "default", &annotations),
        )
        .await;
        assert_eq!(response["allowed"], true);
        assert!(!has_patch(&response));
    }

    #[tokio::test]
    async fn test_non_create_and_foreign_namespaces_are_ignored() {
        for (operation, namespace) in
            [("UPDATE", "default"), ("CREATE", "kube-system"), ("CREATE", "apps")]
        {
            let response = admission_response(
                app(InjectionDefaults::default()),
                &review(operation, namespace, &json!({})),
            )
            .await;
            assert_eq!(response["allowed"], true, "{operation} {namespace}");
            assert!(!has_patch(&response), "{operation} {namespace}");
        }
    }

    #[tokio::test]
    async fn test_unknown_strategy_is_denied() {
        let defaults = InjectionDefaults {
            strategy: "initContainer".to_string(),
            ..InjectionDefaults::default()
        };
        let review = review("CREATE", "jobs", &json!({}));
        let response = admission_response(app(defaults), &review).await;
        assert_eq!(response["allowed"], false);
        assert!(
            response["status"]["message"].as_str().unwrap().contains("initContainer"),
            "{response}"
        );
    }
}
