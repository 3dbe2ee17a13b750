//! The capability list a remote advertises alongside its first reference.

use bstr::{BStr, BString, ByteSlice};

/// A set of capabilities as advertised by the remote, in advertisement order.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Capabilities {
    tokens: Vec<BString>,
}

/// A single advertised capability, `name` or `name=value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capability<'a>(&'a BStr);

impl<'a> Capability<'a> {
    /// The part before `=`, or the whole token.
    pub fn name(&self) -> &'a BStr {
        let token: &'a BStr = self.0;
        match token.find_byte(b'=') {
            Some(pos) => token[..pos].as_bstr(),
            None => token,
        }
    }

    /// The part after `=`, if there is one.
    pub fn value(&self) -> Option<&'a BStr> {
        let token: &'a BStr = self.0;
        token.find_byte(b'=').map(|pos| token[pos + 1..].as_bstr())
    }
}

impl Capabilities {
    /// Parse a space separated capability list, ignoring a trailing newline.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let tokens = bytes
            .split(|b| matches!(*b, b' ' | b'\n'))
            .filter(|token| !token.is_empty())
            .map(|token| token.as_bstr().to_owned())
            .collect();
        Self { tokens }
    }

    /// Return `true` if a capability called `name` is present, with or without a value.
    pub fn contains(&self, name: &str) -> bool {
        self.capability(name).is_some()
    }

    /// Return the value of `name=value`, if `name` is present and has a value.
    pub fn value(&self, name: &str) -> Option<&BStr> {
        self.capability(name).and_then(|cap| cap.value())
    }

    /// Find the capability called `name`.
    pub fn capability(&self, name: &str) -> Option<Capability<'_>> {
        self.iter().find(|cap| cap.name() == name.as_bytes())
    }

    /// Iterate all capabilities in advertisement order.
    pub fn iter(&self) -> impl Iterator<Item = Capability<'_>> + '_ {
        self.tokens.iter().map(|token| Capability(token.as_bstr()))
    }

    /// Add a capability token.
    pub fn push(&mut self, token: impl Into<BString>) {
        self.tokens.push(token.into());
    }

    /// The amount of advertised capabilities.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Return `true` if nothing was advertised.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
