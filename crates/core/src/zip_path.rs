//! Normalized zip-entry path type.
//!
//! A [`ZipPath`] is a value type: an ordered, non-empty-name sequence of
//! path components, always `/`-separated in its serialized form, with the
//! empty sequence representing the archive root. Two paths with the same
//! components are equal regardless of how they were constructed.

use std::fmt;
use thiserror::Error;

/// A single path component was empty, `.`, `..`, or itself contained a `/`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid zip path component: {0:?}")]
pub struct InvalidComponent(pub String);

/// An ordered sequence of validated path components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ZipPath {
    components: Vec<String>,
}

fn validate_component(name: &str) -> Result<(), InvalidComponent> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(InvalidComponent(name.to_string()));
    }
    Ok(())
}

impl ZipPath {
    /// The archive root: the empty component sequence.
    pub fn root() -> Self {
        ZipPath {
            components: Vec::new(),
        }
    }

    /// Build a path from individual, already-split components.
    pub fn from_components<I, S>(components: I) -> Result<Self, InvalidComponent>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        for c in &components {
            validate_component(c)?;
        }
        Ok(ZipPath { components })
    }

    /// Parse a `/`-separated path string. Leading and trailing slashes are
    /// ignored; an entirely empty or all-slash string parses as the root.
    pub fn parse(s: &str) -> Result<Self, InvalidComponent> {
        let components: Vec<String> = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();
        for c in &components {
            validate_component(c)?;
        }
        Ok(ZipPath { components })
    }

    /// Number of path components (`0` for the root).
    pub fn name_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The final component, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// The path with its final component removed, or `None` for the root.
    pub fn parent(&self) -> Option<ZipPath> {
        if self.components.is_empty() {
            return None;
        }
        Some(ZipPath {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// Append a single name to this path.
    pub fn resolve(&self, name: &str) -> Result<ZipPath, InvalidComponent> {
        validate_component(name)?;
        let mut components = self.components.clone();
        components.push(name.to_string());
        Ok(ZipPath { components })
    }

    /// Append another path's components to this one.
    pub fn resolve_path(&self, other: &ZipPath) -> ZipPath {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        ZipPath { components }
    }

    /// Replace this path's final component with `name`, keeping the same
    /// parent. Equivalent to `self.parent().resolve(name)`.
    pub fn resolve_sibling(&self, name: &str) -> Result<ZipPath, InvalidComponent> {
        validate_component(name)?;
        let mut components = if self.components.is_empty() {
            Vec::new()
        } else {
            self.components[..self.components.len() - 1].to_vec()
        };
        components.push(name.to_string());
        Ok(ZipPath { components })
    }

    pub fn starts_with(&self, prefix: &ZipPath) -> bool {
        prefix.components.len() <= self.components.len()
            && self.components[..prefix.components.len()] == prefix.components[..]
    }

    pub fn ends_with(&self, suffix: &ZipPath) -> bool {
        suffix.components.len() <= self.components.len()
            && self.components[self.components.len() - suffix.components.len()..]
                == suffix.components[..]
    }

    /// A slice of this path's components as a new path, `[begin, end)`.
    pub fn subpath(&self, begin: usize, end: usize) -> ZipPath {
        ZipPath {
            components: self.components[begin..end].to_vec(),
        }
    }
}

impl fmt::Display for ZipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_dot_and_dotdot() {
        assert!(ZipPath::parse("res/../x").is_err());
        assert!(ZipPath::parse("res/./x").is_err());
    }

    #[test]
    fn parse_trims_leading_and_trailing_slashes() {
        let p = ZipPath::parse("/lib/arm64-v8a/a.so/").unwrap();
        assert_eq!(p.to_string(), "lib/arm64-v8a/a.so");
        assert_eq!(p.name_count(), 3);
    }

    #[test]
    fn empty_string_is_root() {
        let p = ZipPath::parse("").unwrap();
        assert!(p.is_root());
        assert_eq!(p.file_name(), None);
        assert_eq!(p.parent(), None);
    }

    #[test]
    fn parent_resolve_file_name_round_trips() {
        let p = ZipPath::parse("res/drawable-xhdpi/icon.png").unwrap();
        let rebuilt = p.parent().unwrap().resolve(p.file_name().unwrap()).unwrap();
        assert_eq!(rebuilt, p);
    }

    #[test]
    fn starts_with_and_ends_with() {
        let p = ZipPath::parse("lib/arm64-v8a/libfoo.so").unwrap();
        assert!(p.starts_with(&ZipPath::parse("lib/arm64-v8a").unwrap()));
        assert!(p.ends_with(&ZipPath::parse("arm64-v8a/libfoo.so").unwrap()));
        assert!(!p.starts_with(&ZipPath::parse("lib/armeabi-v7a").unwrap()));
    }

    #[test]
    fn lexicographic_ordering_is_component_wise() {
        let a = ZipPath::parse("lib/arm64-v8a/a.so").unwrap();
        let b = ZipPath::parse("lib/armeabi-v7a/a.so").unwrap();
        assert!(a < b);
    }

    #[test]
    fn resolve_sibling_keeps_parent() {
        let p = ZipPath::parse("dex/classes1.dex").unwrap();
        let sibling = p.resolve_sibling("classes2.dex").unwrap();
        assert_eq!(sibling.to_string(), "dex/classes2.dex");
    }
}
