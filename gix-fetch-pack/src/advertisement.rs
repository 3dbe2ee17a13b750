//! Parsing the reference advertisement of protocol v0 and v1.

use std::io::Read;

use bstr::{BString, ByteSlice};
use gix_fetch_core::{capabilities::Capabilities, pktline::LineReader};
use gix_hash::ObjectId;

use crate::{Error, Ref, Result};

/// The references and capabilities a remote announced at the start of the connection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// All references in advertisement order, with peeled ids attached.
    pub refs: Vec<Ref>,
    /// The capabilities sent along with the first reference.
    pub capabilities: Capabilities,
    /// Commits the remote has as shallow boundary.
    pub shallow: Vec<ObjectId>,
}

impl Advertisement {
    /// Read the advertisement from `read` up to and including its terminating flush packet.
    ///
    /// Nothing past the flush packet is consumed.
    pub fn parse<R: Read>(read: R) -> Result<Self> {
        let mut lines = LineReader::new(read);
        let mut out = Advertisement::default();
        let mut first = true;
        while let Some(line) = lines.read_data_line()? {
            let line = line.strip_suffix(b"\n").unwrap_or(line);
            if let Some(message) = line.strip_prefix(b"ERR ") {
                return Err(Error::Remote {
                    message: message.into(),
                });
            }
            if first && line == b"version 1" {
                continue;
            }
            if let Some(hex) = line.strip_prefix(b"shallow ") {
                out.shallow.push(parse_id(hex, line)?);
                continue;
            }

            let (line, capabilities) = match line.find_byte(0) {
                Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
                None => (line, None),
            };
            if let Some(capabilities) = capabilities {
                if !first {
                    return Err(Error::protocol("capabilities may only follow the first reference"));
                }
                out.capabilities = Capabilities::from_bytes(capabilities);
            }
            first = false;

            let (hex, name) = line
                .split_once_str(b" ")
                .ok_or_else(|| Error::UnexpectedResponse { line: line.into() })?;
            let id = parse_id(hex, line)?;
            if name == b"capabilities^{}" {
                continue;
            }
            match name.strip_suffix(b"^{}") {
                Some(base) => match out.refs.last_mut() {
                    Some(previous) if previous.name == base => previous.peeled_object_id = Some(id),
                    _ => {
                        return Err(Error::protocol(format!(
                            "peeled reference {:?} doesn't follow its reference",
                            name.as_bstr()
                        )))
                    }
                },
                None => out.refs.push(Ref::new(BString::from(name), id)),
            }
        }
        tracing::debug!(
            refs = out.refs.len(),
            capabilities = out.capabilities.len(),
            "parsed advertisement"
        );
        Ok(out)
    }

    /// Find the reference called `name`.
    pub fn find(&self, name: &str) -> Option<&Ref> {
        self.refs.iter().find(|reference| reference.name == name)
    }
}

fn parse_id(hex: &[u8], line: &[u8]) -> Result<ObjectId> {
    ObjectId::from_hex(hex).map_err(|_| Error::UnexpectedResponse { line: line.into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gix_fetch_core::pktline::{write_flush, write_text_line};
    use pretty_assertions::assert_eq;

    const A: &str = "1111111111111111111111111111111111111111";
    const B: &str = "2222222222222222222222222222222222222222";
    const C: &str = "3333333333333333333333333333333333333333";

    fn id(hex: &str) -> ObjectId {
        ObjectId::from_hex(hex.as_bytes()).unwrap()
    }

    fn encode(lines: &[String]) -> Vec<u8> {
        let mut out = Vec::new();
        for line in lines {
            write_text_line(line, &mut out).unwrap();
        }
        write_flush(&mut out).unwrap();
        out
    }

    #[test]
    fn refs_peeled_tags_and_capabilities() {
        let mut input = encode(&[
            format!("{A} HEAD\0multi_ack side-band-64k agent=git/2.43.0"),
            format!("{A} refs/heads/main"),
            format!("{B} refs/tags/v1.0"),
            format!("{C} refs/tags/v1.0^{{}}"),
        ]);
        input.extend_from_slice(b"0008NAK\n");
        let mut read = input.as_slice();
        let advertisement = Advertisement::parse(&mut read).unwrap();

        assert_eq!(
            advertisement.refs,
            vec![
                Ref::new("HEAD", id(A)),
                Ref::new("refs/heads/main", id(A)),
                Ref::new("refs/tags/v1.0", id(B)).with_peeled(id(C)),
            ]
        );
        assert!(advertisement.capabilities.contains("side-band-64k"));
        assert_eq!(advertisement.find("refs/heads/main").map(|r| r.object_id), Some(id(A)));
        assert_eq!(read, b"0008NAK\n", "the rest of the stream is untouched");
    }

    #[test]
    fn empty_remote() {
        let null = "0000000000000000000000000000000000000000";
        let input = encode(&[
            "version 1".into(),
            format!("{null} capabilities^{{}}\0multi_ack_detailed"),
            format!("shallow {B}"),
        ]);
        let advertisement = Advertisement::parse(input.as_slice()).unwrap();
        assert!(advertisement.refs.is_empty());
        assert!(advertisement.capabilities.contains("multi_ack_detailed"));
        assert_eq!(advertisement.shallow, [id(B)]);
    }

    #[test]
    fn remote_errors() {
        let input = encode(&["ERR access denied".into()]);
        let err = Advertisement::parse(input.as_slice()).unwrap_err();
        assert!(matches!(err, Error::Remote { message } if message == "access denied"));
    }

    #[test]
    fn dangling_peeled_ref() {
        let input = encode(&[format!("{A} HEAD\0"), format!("{C} refs/tags/v1.0^{{}}")]);
        assert!(matches!(
            Advertisement::parse(input.as_slice()),
            Err(Error::Protocol { .. })
        ));
    }
}
