//! E-signature REST client with begin/after instrumentation.
//!
//! The client is layered:
//!
//! - [`HttpTransport`] sends authenticated requests and reports outcomes to
//!   a [`TransportObserver`].
//! - [`SignatureApi`] maps each business operation onto the transport.
//! - [`SignClient`] wraps the API with an instrumentation plan, firing
//!   `onBegin<Op>`/`onAfter<Op>` around every operation and, through
//!   [`HookForwarder`], `onError` for every failed request.
//!
//! # Events
//!
//! | Operation | Begin payload | After payload |
//! |-----------|---------------|---------------|
//! | `getAccount` | `[]` | account |
//! | `getSignatureRequest` | `[id]` | signature request |
//! | `listSignatureRequests` | `[query]` | page |
//! | `sendSignatureRequest` | `[request]` | signature request |
//! | `downloadFiles` | exempt | exempt |
//!
//! Request payloads carry file metadata, never file contents.

mod api;
mod config;
mod error;
mod files;
mod form;
mod forwarder;
mod models;
mod pagination;
mod transport;

pub use api::{SignClient, SignatureApi, SignatureApiOperations};
pub use config::{
    API_KEY_VAR, BASE_URL_VAR, CLIENT_ID_VAR, ClientConfig, ConfigError, DEFAULT_BASE_URL,
    DEFAULT_TIMEOUT, TIMEOUT_VAR,
};
pub use error::ClientError;
pub use files::{FileFormat, FileType, FileUpload};
pub use form::{FormBuilder, indexed_key, keyed, list_key};
pub use forwarder::HookForwarder;
pub use models::{
    Account, AccountUpdate, CcRole, DraftType, EmbeddedSignUrl, SendRequest, Signature,
    SignatureRequest, Signer, SignerRole, Template, TemplateSendRequest, UnclaimedDraft,
    UnclaimedDraftRequest,
};
pub use pagination::{DEFAULT_PAGE_SIZE, ListInfo, MAX_PAGE_SIZE, Page, PageQuery};
pub use transport::{
    HttpTransport, INVALID_RESPONSE, RequestFailure, RequestOutcome, TransportObserver,
};
