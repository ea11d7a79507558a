//! Form body construction with bracket-indexed keys.
//!
//! The API takes nested values as flat form fields:
//!
//! ```text
//! signers[0][email_address]=jack@example.com
//! signers[0][name]=Jack
//! cc_email_addresses[0]=legal@example.com
//! metadata[case]=1042
//! file[0]=<binary>
//! ```
//!
//! [`FormBuilder`] collects these fields in insertion order and is sent
//! either url-encoded or, once a file is attached, as multipart.

use reqwest::multipart::Form;

use crate::error::ClientError;
use crate::files::FileUpload;

/// Builds `prefix[index]`.
#[must_use]
pub fn list_key(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

/// Builds `prefix[index][field]`.
#[must_use]
pub fn indexed_key(prefix: &str, index: usize, field: &str) -> String {
    format!("{prefix}[{index}][{field}]")
}

/// Builds `prefix[key]`.
#[must_use]
pub fn keyed(prefix: &str, key: &str) -> String {
    format!("{prefix}[{key}]")
}

/// An ordered set of form fields and file attachments.
#[derive(Debug, Clone, Default)]
pub struct FormBuilder {
    fields: Vec<(String, String)>,
    files: Vec<(String, FileUpload)>,
}

impl FormBuilder {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    pub fn text(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Appends a text field if `value` is present.
    pub fn optional<V: Into<String>>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.text(key, value);
        }
        self
    }

    /// Appends a `1` field when `enabled` is set.
    pub fn flag(&mut self, key: impl Into<String>, enabled: bool) -> &mut Self {
        if enabled {
            self.text(key, "1");
        }
        self
    }

    /// Appends `prefix[0]`, `prefix[1]`, ... for each value.
    pub fn list<I, V>(&mut self, prefix: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for (index, value) in values.into_iter().enumerate() {
            self.text(list_key(prefix, index), value);
        }
        self
    }

    /// Appends `prefix[key]` for each entry.
    pub fn map<'a, I>(&mut self, prefix: &str, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in entries {
            self.text(keyed(prefix, key), value.as_str());
        }
        self
    }

    /// Attaches files as `file[0]`, `file[1]`, ...
    pub fn files<'a, I>(&mut self, uploads: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a FileUpload>,
    {
        let offset = self.files.len();
        for (index, upload) in uploads.into_iter().enumerate() {
            self.files
                .push((list_key("file", offset + index), upload.clone()));
        }
        self
    }

    /// Returns the text fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Returns the value of the first field named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if a file is attached.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }

    /// Converts the form into a multipart body.
    pub fn into_multipart(self) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for (key, value) in self.fields {
            form = form.text(key, value);
        }
        for (key, upload) in self.files {
            form = form.part(key, upload.to_part()?);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn key_helpers() {
        assert_eq!(list_key("cc_email_addresses", 2), "cc_email_addresses[2]");
        assert_eq!(
            indexed_key("signers", 0, "email_address"),
            "signers[0][email_address]"
        );
        assert_eq!(keyed("metadata", "case"), "metadata[case]");
    }

    #[test]
    fn fields_keep_insertion_order() {
        let metadata = BTreeMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]);
        let mut form = FormBuilder::new();
        form.text("title", "NDA")
            .optional("subject", None::<String>)
            .flag("test_mode", true)
            .flag("hide_text_tags", false)
            .list("cc_email_addresses", ["x@example.com", "y@example.com"])
            .map("metadata", &metadata);

        let keys: Vec<_> = form.fields().iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "title",
                "test_mode",
                "cc_email_addresses[0]",
                "cc_email_addresses[1]",
                "metadata[a]",
                "metadata[b]",
            ]
        );
        assert_eq!(form.get("test_mode"), Some("1"));
        assert!(!form.is_multipart());
    }

    #[test]
    fn files_are_indexed_across_calls() {
        let first = FileUpload::new("a.pdf", vec![1]).unwrap();
        let second = FileUpload::new("b.pdf", vec![2]).unwrap();
        let mut form = FormBuilder::new();
        form.files([&first]).files([&second]);

        assert!(form.is_multipart());
        let keys: Vec<_> = form.files.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["file[0]", "file[1]"]);
        assert!(form.into_multipart().is_ok());
    }
}
