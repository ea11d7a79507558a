//! Request and response types of the signature API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::files::FileUpload;
use crate::form::{FormBuilder, indexed_key, keyed};

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

/// The account owning the API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account id.
    pub account_id: String,
    /// Login email address.
    pub email_address: String,
    /// URL receiving account callbacks.
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Whether the account is locked.
    #[serde(default)]
    pub is_locked: bool,
    /// Whether the account is on a paid plan.
    #[serde(default)]
    pub is_paid: bool,
    /// Remaining quotas, as reported by the API.
    #[serde(default)]
    pub quotas: Option<Value>,
}

/// One signer slot of a signature request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Signature id, used for embedded signing.
    pub signature_id: String,
    /// Signer email address.
    pub signer_email_address: String,
    /// Signer name.
    #[serde(default)]
    pub signer_name: Option<String>,
    /// Signing order, when ordered.
    #[serde(default)]
    pub order: Option<u32>,
    /// Status such as `awaiting_signature` or `signed`.
    pub status_code: String,
    /// Unix time of signing.
    #[serde(default)]
    pub signed_at: Option<i64>,
}

/// A signature request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureRequest {
    /// Signature request id.
    pub signature_request_id: String,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Email subject.
    #[serde(default)]
    pub subject: Option<String>,
    /// Email message.
    #[serde(default)]
    pub message: Option<String>,
    /// Whether every signer has signed.
    #[serde(default)]
    pub is_complete: bool,
    /// Whether a signer declined.
    #[serde(default)]
    pub is_declined: bool,
    /// Whether processing failed.
    #[serde(default)]
    pub has_error: bool,
    /// Requester email address.
    #[serde(default)]
    pub requester_email_address: Option<String>,
    /// Page showing request details.
    #[serde(default)]
    pub details_url: Option<String>,
    /// Signer slots.
    #[serde(default)]
    pub signatures: Vec<Signature>,
    /// Caller-supplied metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Unix time of creation.
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A signer role of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignerRole {
    /// Role name, e.g. `Client`.
    pub name: String,
    /// Signing order, when ordered.
    #[serde(default)]
    pub order: Option<u32>,
}

/// A CC role of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CcRole {
    /// Role name.
    pub name: String,
}

/// A reusable template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template id.
    pub template_id: String,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Default message.
    #[serde(default)]
    pub message: Option<String>,
    /// Signer roles to fill when sending.
    #[serde(default)]
    pub signer_roles: Vec<SignerRole>,
    /// CC roles to fill when sending.
    #[serde(default)]
    pub cc_roles: Vec<CcRole>,
    /// Whether the key's account can edit the template.
    #[serde(default)]
    pub can_edit: bool,
    /// Unix time of the last update.
    #[serde(default)]
    pub updated_at: Option<i64>,
}

/// A short-lived URL for signing inside an iframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedSignUrl {
    /// The URL to load.
    pub sign_url: String,
    /// Unix time after which the URL stops working.
    pub expires_at: i64,
}

/// A draft the requester finishes in an embedded editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnclaimedDraft {
    /// URL of the editor.
    pub claim_url: String,
    /// Id of the request the draft becomes once sent.
    #[serde(default)]
    pub signature_request_id: Option<String>,
    /// Unix time after which the claim URL stops working.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Whether the draft is in test mode.
    #[serde(default)]
    pub test_mode: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// A person asked to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signer {
    /// Email address.
    pub email_address: String,
    /// Display name.
    pub name: String,
    /// Signing order, when ordered.
    pub order: Option<u32>,
    /// Access code required to open the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

impl Signer {
    /// Creates a signer.
    pub fn new(email_address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            name: name.into(),
            order: None,
            pin: None,
        }
    }

    /// Sets the signing order.
    #[must_use]
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the access code.
    #[must_use]
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    fn write(&self, form: &mut FormBuilder, prefix: &str, slot: SignerSlot<'_>) {
        let key = |field: &str| match slot {
            SignerSlot::Index(index) => indexed_key(prefix, index, field),
            SignerSlot::Role(role) => format!("{}[{field}]", keyed(prefix, role)),
        };
        form.text(key("email_address"), self.email_address.as_str())
            .text(key("name"), self.name.as_str())
            .optional(key("order"), self.order.map(|order| order.to_string()))
            .optional(key("pin"), self.pin.as_deref());
    }
}

#[derive(Clone, Copy)]
enum SignerSlot<'a> {
    Index(usize),
    Role(&'a str),
}

/// Account settings to change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountUpdate {
    /// New callback URL.
    pub callback_url: Option<String>,
}

impl AccountUpdate {
    pub(crate) fn to_form(&self) -> Result<FormBuilder, ClientError> {
        if self.callback_url.is_none() {
            return Err(ClientError::InvalidRequest(
                "account update changes nothing".into(),
            ));
        }
        let mut form = FormBuilder::new();
        form.optional("callback_url", self.callback_url.as_deref());
        Ok(form)
    }
}

/// A new signature request built from uploaded documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendRequest {
    /// Title.
    pub title: Option<String>,
    /// Email subject.
    pub subject: Option<String>,
    /// Email message.
    pub message: Option<String>,
    /// Signers, in slot order.
    pub signers: Vec<Signer>,
    /// Addresses copied on the request.
    pub cc_email_addresses: Vec<String>,
    /// Documents to upload.
    pub files: Vec<FileUpload>,
    /// Documents to fetch by URL.
    pub file_urls: Vec<String>,
    /// Caller-supplied metadata.
    pub metadata: BTreeMap<String, String>,
    /// Whether the request is non-binding.
    pub test_mode: bool,
}

impl SendRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a signer.
    #[must_use]
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signers.push(signer);
        self
    }

    /// Copies `email_address` on the request.
    #[must_use]
    pub fn with_cc(mut self, email_address: impl Into<String>) -> Self {
        self.cc_email_addresses.push(email_address.into());
        self
    }

    /// Attaches a document.
    #[must_use]
    pub fn with_file(mut self, file: FileUpload) -> Self {
        self.files.push(file);
        self
    }

    /// Attaches a document by URL.
    #[must_use]
    pub fn with_file_url(mut self, url: impl Into<String>) -> Self {
        self.file_urls.push(url.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Marks the request as non-binding.
    #[must_use]
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub(crate) fn to_form(&self) -> Result<FormBuilder, ClientError> {
        if self.signers.is_empty() {
            return Err(ClientError::InvalidRequest(
                "a signature request needs at least one signer".into(),
            ));
        }
        let mut form = documents_form(&self.files, &self.file_urls)?;
        form.optional("title", self.title.as_deref())
            .optional("subject", self.subject.as_deref())
            .optional("message", self.message.as_deref());
        for (index, signer) in self.signers.iter().enumerate() {
            signer.write(&mut form, "signers", SignerSlot::Index(index));
        }
        form.list("cc_email_addresses", self.cc_email_addresses.iter().cloned())
            .map("metadata", &self.metadata)
            .flag("test_mode", self.test_mode);
        Ok(form)
    }
}

/// A new signature request built from a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateSendRequest {
    /// Templates to combine, in order.
    pub template_ids: Vec<String>,
    /// Title.
    pub title: Option<String>,
    /// Email subject.
    pub subject: Option<String>,
    /// Email message.
    pub message: Option<String>,
    /// Signers keyed by template role.
    pub signers: BTreeMap<String, Signer>,
    /// CC addresses keyed by template role.
    pub ccs: BTreeMap<String, String>,
    /// Values of merge fields.
    pub custom_fields: BTreeMap<String, String>,
    /// Caller-supplied metadata.
    pub metadata: BTreeMap<String, String>,
    /// Whether the request is non-binding.
    pub test_mode: bool,
}

impl TemplateSendRequest {
    /// Creates a request from one template.
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_ids: vec![template_id.into()],
            ..Self::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Assigns a signer to a template role.
    #[must_use]
    pub fn with_signer(mut self, role: impl Into<String>, signer: Signer) -> Self {
        self.signers.insert(role.into(), signer);
        self
    }

    /// Assigns a CC address to a template role.
    #[must_use]
    pub fn with_cc(mut self, role: impl Into<String>, email_address: impl Into<String>) -> Self {
        self.ccs.insert(role.into(), email_address.into());
        self
    }

    /// Sets a merge field.
    #[must_use]
    pub fn with_custom_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.insert(name.into(), value.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Marks the request as non-binding.
    #[must_use]
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub(crate) fn to_form(&self) -> Result<FormBuilder, ClientError> {
        if self.template_ids.is_empty() {
            return Err(ClientError::InvalidRequest(
                "a template request needs a template id".into(),
            ));
        }
        if self.signers.is_empty() {
            return Err(ClientError::InvalidRequest(
                "a template request needs at least one signer".into(),
            ));
        }

        let mut form = FormBuilder::new();
        form.list("template_ids", self.template_ids.iter().cloned())
            .optional("title", self.title.as_deref())
            .optional("subject", self.subject.as_deref())
            .optional("message", self.message.as_deref());
        for (role, signer) in &self.signers {
            signer.write(&mut form, "signers", SignerSlot::Role(role));
        }
        for (role, email_address) in &self.ccs {
            form.text(
                format!("{}[email_address]", keyed("ccs", role)),
                email_address.as_str(),
            );
        }
        if !self.custom_fields.is_empty() {
            let fields: Vec<_> = self
                .custom_fields
                .iter()
                .map(|(name, value)| serde_json::json!({"name": name, "value": value}))
                .collect();
            form.text("custom_fields", serde_json::to_string(&fields)?);
        }
        form.map("metadata", &self.metadata)
            .flag("test_mode", self.test_mode);
        Ok(form)
    }
}

/// Who finishes an unclaimed draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftType {
    /// The requester sends the document to others.
    #[default]
    SendDocument,
    /// The requester asks others to sign.
    RequestSignature,
}

impl DraftType {
    fn as_str(self) -> &'static str {
        match self {
            Self::SendDocument => "send_document",
            Self::RequestSignature => "request_signature",
        }
    }
}

/// A draft to be completed in an embedded editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnclaimedDraftRequest {
    /// Email address of the person completing the draft.
    pub requester_email_address: String,
    /// Draft type.
    pub draft_type: DraftType,
    /// Documents to upload.
    pub files: Vec<FileUpload>,
    /// Documents to fetch by URL.
    pub file_urls: Vec<String>,
    /// Pre-filled signers.
    pub signers: Vec<Signer>,
    /// Email subject.
    pub subject: Option<String>,
    /// Email message.
    pub message: Option<String>,
    /// Whether the sent request may itself be signed embedded.
    pub is_for_embedded_signing: bool,
    /// Whether the draft is non-binding.
    pub test_mode: bool,
}

impl UnclaimedDraftRequest {
    /// Creates a draft for `requester_email_address`.
    pub fn new(requester_email_address: impl Into<String>) -> Self {
        Self {
            requester_email_address: requester_email_address.into(),
            ..Self::default()
        }
    }

    /// Sets the draft type.
    #[must_use]
    pub fn with_draft_type(mut self, draft_type: DraftType) -> Self {
        self.draft_type = draft_type;
        self
    }

    /// Attaches a document.
    #[must_use]
    pub fn with_file(mut self, file: FileUpload) -> Self {
        self.files.push(file);
        self
    }

    /// Attaches a document by URL.
    #[must_use]
    pub fn with_file_url(mut self, url: impl Into<String>) -> Self {
        self.file_urls.push(url.into());
        self
    }

    /// Adds a signer.
    #[must_use]
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signers.push(signer);
        self
    }

    /// Marks the draft as non-binding.
    #[must_use]
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub(crate) fn to_form(&self, client_id: &str) -> Result<FormBuilder, ClientError> {
        if self.requester_email_address.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "an unclaimed draft needs a requester email address".into(),
            ));
        }
        let mut form = documents_form(&self.files, &self.file_urls)?;
        form.text("client_id", client_id)
            .text("requester_email_address", self.requester_email_address.as_str())
            .text("type", self.draft_type.as_str())
            .optional("subject", self.subject.as_deref())
            .optional("message", self.message.as_deref());
        for (index, signer) in self.signers.iter().enumerate() {
            signer.write(&mut form, "signers", SignerSlot::Index(index));
        }
        form.flag("is_for_embedded_signing", self.is_for_embedded_signing)
            .flag("test_mode", self.test_mode);
        Ok(form)
    }
}

/// Starts a form with either uploaded files or file URLs.
fn documents_form(files: &[FileUpload], file_urls: &[String]) -> Result<FormBuilder, ClientError> {
    match (files.is_empty(), file_urls.is_empty()) {
        (true, true) => Err(ClientError::InvalidRequest(
            "attach at least one file or file URL".into(),
        )),
        (false, false) => Err(ClientError::InvalidRequest(
            "files and file URLs cannot be mixed".into(),
        )),
        _ => {
            let mut form = FormBuilder::new();
            form.files(files).list("file_url", file_urls.iter().cloned());
            Ok(form)
        }
    }
}
