//! Operation declarations.
//!
//! An [`OperationSet`] lists the asynchronous operations a type exposes,
//! together with their exemption flags. Sets are `const`-constructible so
//! the `#[operations]` macro can emit them as statics, and they link to a
//! parent set to model an inheritance chain.
//!
//! ```
//! use quillsign_instrument::{OperationDecl, OperationSet};
//!
//! static BASE: OperationSet = OperationSet::new(
//!     "Base",
//!     &[OperationDecl::new("ping"), OperationDecl::new("close").exempt()],
//! );
//!
//! fn base() -> &'static OperationSet {
//!     &BASE
//! }
//!
//! static DERIVED: OperationSet =
//!     OperationSet::new("Derived", &[OperationDecl::new("close")]).extends(base);
//!
//! let names: Vec<_> = DERIVED.chain().map(OperationSet::type_name).collect();
//! assert_eq!(names, ["Derived", "Base"]);
//! ```

/// Whether an operation's arguments can be captured for hook payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationShape {
    /// Concrete argument list; the operation can be wrapped.
    Fixed,
    /// Generic signature; wrapping is skipped and logged.
    Dynamic,
}

/// Declaration of a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationDecl {
    name: &'static str,
    exempt: bool,
    shape: OperationShape,
}

impl OperationDecl {
    /// Declares a fixed-shape, non-exempt operation.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            exempt: false,
            shape: OperationShape::Fixed,
        }
    }

    /// Marks the operation exempt from instrumentation.
    ///
    /// The mark belongs to this declaration only: an override in a derived
    /// set is wrapped unless it is marked again.
    #[must_use]
    pub const fn exempt(self) -> Self {
        Self {
            exempt: true,
            ..self
        }
    }

    /// Marks the operation as dynamically shaped.
    #[must_use]
    pub const fn dynamic(self) -> Self {
        Self {
            shape: OperationShape::Dynamic,
            ..self
        }
    }

    /// Returns the operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the declaration carries an exemption mark.
    #[must_use]
    pub const fn is_exempt(&self) -> bool {
        self.exempt
    }

    /// Returns the declared shape.
    #[must_use]
    pub const fn shape(&self) -> OperationShape {
        self.shape
    }
}

/// The operations declared by one type, linked to its parent's set.
#[derive(Debug)]
pub struct OperationSet {
    type_name: &'static str,
    operations: &'static [OperationDecl],
    parent: Option<fn() -> &'static OperationSet>,
}

impl OperationSet {
    /// Creates a set with no parent.
    #[must_use]
    pub const fn new(type_name: &'static str, operations: &'static [OperationDecl]) -> Self {
        Self {
            type_name,
            operations,
            parent: None,
        }
    }

    /// Links this set to the set of the type it extends.
    #[must_use]
    pub const fn extends(self, parent: fn() -> &'static OperationSet) -> Self {
        Self {
            parent: Some(parent),
            ..self
        }
    }

    /// Returns the name of the declaring type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the operations declared directly on this type.
    #[must_use]
    pub const fn operations(&self) -> &'static [OperationDecl] {
        self.operations
    }

    /// Returns the parent set, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&'static OperationSet> {
        self.parent.map(|parent| parent())
    }

    /// Iterates from this set up through its ancestors.
    pub fn chain(&self) -> impl Iterator<Item = &OperationSet> {
        core::iter::successors(Some(self), |set| set.parent())
    }
}

/// Types whose operations can be instrumented.
///
/// Usually implemented by the `#[operations]` attribute macro.
pub trait Operations {
    /// Returns the declared operations of the implementing type.
    fn operation_set() -> &'static OperationSet;
}

#[cfg(test)]
mod tests {
    use super::*;

    static ROOT: OperationSet = OperationSet::new(
        "Root",
        &[
            OperationDecl::new("create"),
            OperationDecl::new("purge").exempt(),
            OperationDecl::new("stream").dynamic(),
        ],
    );

    fn root() -> &'static OperationSet {
        &ROOT
    }

    static CHILD: OperationSet = OperationSet::new("Child", &[]).extends(root);

    #[test]
    fn decl_builders_set_flags() {
        let decl = OperationDecl::new("purge").exempt().dynamic();
        assert_eq!(decl.name(), "purge");
        assert!(decl.is_exempt());
        assert_eq!(decl.shape(), OperationShape::Dynamic);

        let plain = OperationDecl::new("create");
        assert!(!plain.is_exempt());
        assert_eq!(plain.shape(), OperationShape::Fixed);
    }

    #[test]
    fn chain_walks_to_root() {
        let names: Vec<_> = CHILD.chain().map(OperationSet::type_name).collect();
        assert_eq!(names, vec!["Child", "Root"]);
        assert!(ROOT.parent().is_none());
        assert_eq!(CHILD.parent().map(OperationSet::type_name), Some("Root"));
    }

    #[test]
    fn operations_are_declared_in_order() {
        let names: Vec<_> = ROOT.operations().iter().map(OperationDecl::name).collect();
        assert_eq!(names, vec!["create", "purge", "stream"]);
    }
}
