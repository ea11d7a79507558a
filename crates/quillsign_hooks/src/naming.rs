//! Event naming for instrumented operations.
//!
//! Every instrumented operation `m` owns exactly two events:
//! `onBegin<Capitalize(m)>` and `onAfter<Capitalize(m)>`. Capitalization
//! touches only the first character, so `getDocumentData` yields
//! `onBeginGetDocumentData` and `onAfterGetDocumentData`.
//!
//! Rust methods are `snake_case`; their operation name is the
//! lowerCamelCase form returned by [`operation_name`].

use core::fmt;

/// Event the HTTP transport forwards request failures into.
pub const ON_ERROR: &str = "onError";

/// Lifecycle point of an operation invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPrefix {
    /// Fired with the call arguments before the operation runs.
    Begin,
    /// Fired with the resolved value after the operation succeeds.
    After,
}

impl EventPrefix {
    /// Returns the literal prefix prepended to the operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "onBegin",
            Self::After => "onAfter",
        }
    }
}

impl fmt::Display for EventPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uppercases the first character of `s`, leaving the rest untouched.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Derives the event name for `operation` at the given lifecycle point.
///
/// # Example
///
/// ```
/// use quillsign_hooks::{EventPrefix, derive_event_name};
///
/// assert_eq!(
///     derive_event_name(EventPrefix::Begin, "getDocumentData"),
///     "onBeginGetDocumentData"
/// );
/// ```
#[must_use]
pub fn derive_event_name(prefix: EventPrefix, operation: &str) -> String {
    format!("{}{}", prefix.as_str(), capitalize(operation))
}

/// Converts a `snake_case` method identifier into its operation name.
///
/// Empty segments (leading, trailing or doubled underscores) are dropped.
///
/// ```
/// use quillsign_hooks::naming::operation_name;
///
/// assert_eq!(operation_name("get_document_data"), "getDocumentData");
/// assert_eq!(operation_name("create"), "create");
/// ```
#[must_use]
pub fn operation_name(ident: &str) -> String {
    let mut segments = ident.split('_').filter(|segment| !segment.is_empty());
    let mut name = segments.next().map(str::to_owned).unwrap_or_default();
    for segment in segments {
        name.push_str(&capitalize(segment));
    }
    name
}

/// The pair of events owned by one operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventNames {
    /// `onBegin<Op>`.
    pub begin: String,
    /// `onAfter<Op>`.
    pub after: String,
}

impl EventNames {
    /// Derives both event names for `operation`.
    #[must_use]
    pub fn for_operation(operation: &str) -> Self {
        Self {
            begin: derive_event_name(EventPrefix::Begin, operation),
            after: derive_event_name(EventPrefix::After, operation),
        }
    }

    /// Returns the event name for the given lifecycle point.
    #[must_use]
    pub fn get(&self, prefix: EventPrefix) -> &str {
        match prefix {
            EventPrefix::Begin => &self.begin,
            EventPrefix::After => &self.after,
        }
    }
}
