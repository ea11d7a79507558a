//! Signature API operations.
//!
//! [`SignatureApi`] performs the calls; [`SignClient`] is the same object
//! wrapped with begin/after instrumentation. Every operation except
//! [`download_files`](SignatureApi::download_files) fires
//! `onBegin<Op>` with its arguments and `onAfter<Op>` with its result, and
//! transport failures fire `onError` on the same registry.
//!
//! ```no_run
//! use quillsign_client::{ClientConfig, PageQuery, SignatureApi, SignatureApiOperations};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SignatureApi::connect(ClientConfig::from_env()?)?;
//! client
//!     .hooks()
//!     .expect("connect attaches a registry")
//!     .register("onAfterGetAccount", |account| tracing::info!(%account, "account loaded"))?;
//!
//! let account = client.get_account().await?;
//! let page = client.list_signature_requests(&PageQuery::new()).await?;
//! # let _ = (account, page);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use quillsign_hooks::HookRegistry;
use quillsign_instrument::{Instrumented, operations};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::files::FileFormat;
use crate::form::FormBuilder;
use crate::forwarder::HookForwarder;
use crate::models::{
    Account, AccountUpdate, EmbeddedSignUrl, SendRequest, SignatureRequest, Template,
    TemplateSendRequest, UnclaimedDraft, UnclaimedDraftRequest,
};
use crate::pagination::{Page, PageQuery};
use crate::transport::HttpTransport;

/// An instrumented [`SignatureApi`].
pub type SignClient = Instrumented<SignatureApi>;

/// Plain signature API client.
#[derive(Debug, Clone)]
pub struct SignatureApi {
    transport: HttpTransport,
    client_id: Option<String>,
}

impl SignatureApi {
    /// Creates a client over `transport`.
    #[must_use]
    pub fn new(transport: HttpTransport, client_id: Option<String>) -> Self {
        Self {
            transport,
            client_id,
        }
    }

    /// Builds an instrumented client for `config`.
    ///
    /// The returned client owns a fresh registry that receives both the
    /// begin/after events and the transport's `onError` events.
    pub fn connect(config: ClientConfig) -> Result<SignClient, ClientError> {
        let hooks = Arc::new(HookRegistry::new());
        let transport = HttpTransport::new(&config)?
            .with_observer(Arc::new(HookForwarder::new(Arc::clone(&hooks))));
        let api = Self::new(transport, config.client_id().map(str::to_owned));
        Ok(Instrumented::builder(api).hooks(hooks).build()?)
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    fn require_client_id(&self) -> Result<&str, ClientError> {
        self.client_id.as_deref().ok_or_else(|| {
            ClientError::InvalidRequest("embedded drafts require a client id".into())
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: FormBuilder,
    ) -> Result<T, ClientError> {
        if form.is_multipart() {
            self.transport.post_multipart(path, form).await
        } else {
            self.transport.post_form(path, &form).await
        }
    }
}

#[operations]
impl SignatureApi {
    /// Returns the account owning the API key.
    pub async fn get_account(&self) -> Result<Account, ClientError> {
        let body = self.transport.get_json("account", &[]).await?;
        unwrap_envelope(body, "account")
    }

    /// Changes account settings.
    pub async fn update_account(&self, update: &AccountUpdate) -> Result<Account, ClientError> {
        let body = self.post("account", update.to_form()?).await?;
        unwrap_envelope(body, "account")
    }

    /// Returns one signature request.
    pub async fn get_signature_request(
        &self,
        signature_request_id: &str,
    ) -> Result<SignatureRequest, ClientError> {
        let path = format!("signature_request/{}", path_id(signature_request_id)?);
        let body = self.transport.get_json(&path, &[]).await?;
        unwrap_envelope(body, "signature_request")
    }

    /// Lists signature requests visible to the account.
    pub async fn list_signature_requests(
        &self,
        query: &PageQuery,
    ) -> Result<Page<SignatureRequest>, ClientError> {
        let body = self
            .transport
            .get_json("signature_request/list", &query.to_pairs())
            .await?;
        Page::from_envelope(body, "signature_requests")
    }

    /// Sends a signature request for uploaded documents.
    pub async fn send_signature_request(
        &self,
        request: &SendRequest,
    ) -> Result<SignatureRequest, ClientError> {
        let body = self
            .post("signature_request/send", request.to_form()?)
            .await?;
        unwrap_envelope(body, "signature_request")
    }

    /// Sends a signature request based on templates.
    pub async fn send_with_template(
        &self,
        request: &TemplateSendRequest,
    ) -> Result<SignatureRequest, ClientError> {
        let body = self
            .post("signature_request/send_with_template", request.to_form()?)
            .await?;
        unwrap_envelope(body, "signature_request")
    }

    /// Emails a reminder to a signer who has not signed yet.
    pub async fn remind_signature_request(
        &self,
        signature_request_id: &str,
        email_address: &str,
    ) -> Result<SignatureRequest, ClientError> {
        let path = format!("signature_request/remind/{}", path_id(signature_request_id)?);
        let mut form = FormBuilder::new();
        form.text("email_address", email_address);
        let body = self.post(&path, form).await?;
        unwrap_envelope(body, "signature_request")
    }

    /// Cancels an incomplete signature request.
    pub async fn cancel_signature_request(
        &self,
        signature_request_id: &str,
    ) -> Result<(), ClientError> {
        let path = format!("signature_request/cancel/{}", path_id(signature_request_id)?);
        self.transport.post_empty(&path).await
    }

    /// Returns one template.
    pub async fn get_template(&self, template_id: &str) -> Result<Template, ClientError> {
        let path = format!("template/{}", path_id(template_id)?);
        let body = self.transport.get_json(&path, &[]).await?;
        unwrap_envelope(body, "template")
    }

    /// Lists templates visible to the account.
    pub async fn list_templates(&self, query: &PageQuery) -> Result<Page<Template>, ClientError> {
        let body = self
            .transport
            .get_json("template/list", &query.to_pairs())
            .await?;
        Page::from_envelope(body, "templates")
    }

    /// Deletes a template.
    pub async fn delete_template(&self, template_id: &str) -> Result<(), ClientError> {
        let path = format!("template/{}", path_id(template_id)?);
        self.transport.delete(&path).await
    }

    /// Returns a URL for signing one signature slot inside an iframe.
    pub async fn get_embedded_sign_url(
        &self,
        signature_id: &str,
    ) -> Result<EmbeddedSignUrl, ClientError> {
        let path = format!("embedded/sign_url/{}", path_id(signature_id)?);
        let body = self.transport.get_json(&path, &[]).await?;
        unwrap_envelope(body, "embedded")
    }

    /// Creates a draft to be completed in an embedded editor.
    pub async fn create_embedded_unclaimed_draft(
        &self,
        request: &UnclaimedDraftRequest,
    ) -> Result<UnclaimedDraft, ClientError> {
        let form = request.to_form(self.require_client_id()?)?;
        let body = self.post("unclaimed_draft/create_embedded", form).await?;
        unwrap_envelope(body, "unclaimed_draft")
    }

    /// Downloads the documents of a signature request.
    #[exempt]
    pub async fn download_files(
        &self,
        signature_request_id: &str,
        format: FileFormat,
    ) -> Result<Vec<u8>, ClientError> {
        let path = format!("signature_request/files/{}", path_id(signature_request_id)?);
        self.transport
            .get_bytes(&path, &[("file_type", format.as_str().to_string())])
            .await
    }
}

/// Reads the object under `key` from a `{ "<key>": {...} }` body.
fn unwrap_envelope<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<T, ClientError> {
    let inner = body
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| ClientError::InvalidResponse(format!("missing '{key}'")))?;
    serde_json::from_value(inner)
        .map_err(|err| ClientError::InvalidResponse(format!("'{key}': {err}")))
}

/// Accepts ids that are safe to place in a path segment.
fn path_id(id: &str) -> Result<&str, ClientError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(ClientError::InvalidRequest(format!("invalid id: '{id}'")))
    }
}
