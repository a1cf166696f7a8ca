use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use json_patch::{Patch, jsonptr::Pointer};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    Api,
    api::DynamicObject,
    core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
};
use snafu::ResultExt;
use tzinject_core::{Annotations, InjectionDefaults, Injector, Resource};

use super::{
    NamespaceFilter,
    error::{self, Error},
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// State shared by every admission request.
pub struct AdmissionState {
    defaults: InjectionDefaults,
    filter: NamespaceFilter,
    /// Present only when namespace annotations take part in the resolution.
    namespaces: Option<Api<Namespace>>,
}

impl AdmissionState {
    pub const fn new(
        defaults: InjectionDefaults,
        filter: NamespaceFilter,
        namespaces: Option<Api<Namespace>>,
    ) -> Self {
        Self { defaults, filter, namespaces }
    }

    /// Builds the response for one request.
    ///
    /// Requests other than `CREATE` and requests outside the admissible
    /// namespaces are allowed unchanged. A failure to generate the patch denies
    /// the request.
    ///
    /// # Errors
    ///
    /// Fails only when the generated patch cannot be serialized.
    pub async fn review(
        &self,
        request: &AdmissionRequest<DynamicObject>,
    ) -> Result<AdmissionResponse, Error> {
        let response = AdmissionResponse::from(request);
        let Some(namespace) =
            request.namespace.as_deref().filter(|namespace| self.filter.is_admissible(namespace))
        else {
            tracing::debug!(
                uid = %request.uid,
                namespace = ?request.namespace,
                "Namespace not handled"
            );
            return Ok(response);
        };
        if !matches!(request.operation, Operation::Create) {
            return Ok(response);
        }
        let Some(object) = &request.object else {
            return Ok(response);
        };

        match self.generate(namespace, object).await {
            Ok(patch) if patch.0.is_empty() => Ok(response),
            Ok(patch) => {
                tracing::info!(
                    uid = %request.uid,
                    %namespace,
                    name = %request.name,
                    operations = patch.0.len(),
                    "Accept request with generated patch"
                );
                response.with_patch(patch).context(error::SerializePatchSnafu)
            }
            Err(err) => {
                tracing::warn!(
                    uid = %request.uid,
                    %namespace,
                    name = %request.name,
                    "Reject request, {err}"
                );
                Ok(response.deny(err.to_string()))
            }
        }
    }

    async fn generate(&self, namespace: &str, object: &DynamicObject) -> Result<Patch, Error> {
        let object = serde_json::to_value(object).context(error::ConvertObjectSnafu)?;
        let Some(resource) = Resource::classify(&object).context(error::GeneratePatchSnafu)? else {
            return Ok(Patch(Vec::new()));
        };

        let annotations = self.namespace_annotations(namespace).await?;
        let injector = Injector::new(&self.defaults);
        let injector = match &annotations {
            Some(annotations) => injector.with_namespace(annotations),
            None => injector,
        };
        injector.generate(&resource, Pointer::root()).context(error::GeneratePatchSnafu)
    }

    async fn namespace_annotations(&self, namespace: &str) -> Result<Option<Annotations>, Error> {
        let Some(api) = &self.namespaces else {
            return Ok(None);
        };
        let namespace = api
            .get(namespace)
            .await
            .with_context(|_| error::LookupNamespaceSnafu { namespace: namespace.to_string() })?;
        Ok(Some(namespace.metadata.annotations.unwrap_or_default()))
    }
}

pub async fn admit(
    State(state): State<Arc<AdmissionState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers.get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok());
    if content_type != Some(JSON_CONTENT_TYPE) {
        let message = format!(
            "unsupported content type {}, only {JSON_CONTENT_TYPE} is supported",
            content_type.unwrap_or_default()
        );
        tracing::warn!("{message}");
        return (StatusCode::BAD_REQUEST, message).into_response();
    }

    let review = match serde_json::from_slice::<AdmissionReview<DynamicObject>>(&body) {
        Ok(review) => review,
        Err(err) => {
            tracing::warn!("Failed to deserialize admission review, error: {err}");
            let message = format!("could not deserialize admission review: {err}");
            return (StatusCode::BAD_REQUEST, message).into_response();
        }
    };
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!("Admission review carries no request, error: {err}");
            return (StatusCode::BAD_REQUEST, format!("invalid admission review: {err}"))
                .into_response();
        }
    };

    match state.review(&request).await {
        Ok(response) => Json(response.into_review()).into_response(),
        Err(err) => {
            tracing::error!(uid = %request.uid, "{err}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
