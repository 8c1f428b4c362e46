//! Stub stream serialization.
//!
//! Layout:
//!
//! ```text
//! u32 magic (big-endian "STBB")
//! varuint format_version
//! varuint string_table_offset
//! root frame:  varuint type_id . payload . varuint child_count . child frames
//! string table: varuint count . count * (varuint len . utf-8 bytes)
//! ```
//!
//! Index contributions are collected while the frames are written, so stub
//! ids in the index are exactly the preorder numbers of the stream.
//!
//! The deserializer only accepts canonical streams: re-serializing a decoded
//! tree reproduces the input byte for byte.

use crate::element_type::ElementTypeId;
use crate::error::StubError;
use crate::error::StubResult;
use crate::index::IndexContributions;
use crate::registry::ElementTypeRegistry;
use crate::stream::StubInputStream;
use crate::stream::StubOutputStream;
use crate::stream::put_varuint;
use crate::stream::read_varuint_at;
use crate::stream::varuint_len;
use crate::stub::StubId;
use crate::stub::StubTree;
use crate::stub::StubTreeAssembler;
use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Stream magic, "STBB".
pub const STUB_STREAM_MAGIC: u32 = 0x5354_4242;

/// Decoded stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub version: u32,
    pub string_table_offset: usize,
    /// Offset of the root frame.
    pub frames_offset: usize,
}

/// Read the header without touching frames or strings.
pub fn peek_header(bytes: &[u8]) -> StubResult<StreamHeader> {
    let magic = bytes
        .get(..4)
        .ok_or(StubError::TruncatedStream { offset: bytes.len() })?;
    let magic = u32::from_be_bytes([magic[0], magic[1], magic[2], magic[3]]);
    if magic != STUB_STREAM_MAGIC {
        return Err(StubError::PayloadMismatch(format!(
            "bad stream magic {magic:#010x}"
        )));
    }
    let (version, n) = read_varuint_at(bytes, 4)?;
    let version = u32::try_from(version)
        .map_err(|_| StubError::PayloadMismatch(format!("version {version} exceeds u32")))?;
    let (offset, m) = read_varuint_at(bytes, 4 + n)?;
    Ok(StreamHeader {
        version,
        string_table_offset: usize::try_from(offset).unwrap_or(usize::MAX),
        frames_offset: 4 + n + m,
    })
}

/// Serializer and deserializer bound to one registry.
#[derive(Debug, Clone)]
pub struct StubSerializer {
    registry: Arc<ElementTypeRegistry>,
}

impl StubSerializer {
    pub const fn new(registry: Arc<ElementTypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ElementTypeRegistry> {
        &self.registry
    }

    /// Serialize `tree`, discarding index contributions.
    pub fn serialize(&self, tree: &StubTree, cancel: &CancellationToken) -> StubResult<Bytes> {
        Ok(self.serialize_with_index(tree, cancel)?.0)
    }

    /// Serialize `tree` and collect its index contributions in the same pass.
    pub fn serialize_with_index(
        &self,
        tree: &StubTree,
        cancel: &CancellationToken,
    ) -> StubResult<(Bytes, IndexContributions)> {
        let mut out = StubOutputStream::new();
        let mut contributions = IndexContributions::new();

        // The arena is in preorder, so walking it in order writes each frame
        // header before the frames of its children.
        for stub in tree.iter() {
            if cancel.is_cancelled() {
                return Err(StubError::Cancelled);
            }
            let type_id = stub.type_id();
            self.registry.lookup(type_id)?;
            let element_type = stub.element_type();
            out.write_u32(type_id.0);
            element_type.serialize(stub.payload(), &mut out)?;
            out.write_varuint(stub.children().count() as u64);
            element_type.index_stub(stub.payload(), &mut contributions.sink_for(stub.id()));
        }

        let version = self.registry.version();
        let (frames, table) = out.into_parts();
        let fixed = 4 + varuint_len(u64::from(version)) + frames.len();
        let mut offset_len = 1;
        let offset = loop {
            let offset = fixed + offset_len;
            let needed = varuint_len(offset as u64);
            if needed == offset_len {
                break offset;
            }
            offset_len = needed;
        };

        let mut buf = BytesMut::with_capacity(offset + table.len());
        buf.put_u32(STUB_STREAM_MAGIC);
        put_varuint(&mut buf, u64::from(version));
        put_varuint(&mut buf, offset as u64);
        buf.put_slice(&frames);
        buf.put_slice(&table);

        debug!(
            stubs = tree.len(),
            bytes = buf.len(),
            keys = contributions.len(),
            "serialized stub tree"
        );
        Ok((buf.freeze(), contributions))
    }

    /// Run only the index pass of serialization.
    pub fn index_only(
        &self,
        tree: &StubTree,
        cancel: &CancellationToken,
    ) -> StubResult<IndexContributions> {
        let mut contributions = IndexContributions::new();
        for stub in tree.iter() {
            if cancel.is_cancelled() {
                return Err(StubError::Cancelled);
            }
            stub.element_type()
                .index_stub(stub.payload(), &mut contributions.sink_for(stub.id()));
        }
        Ok(contributions)
    }

    /// Deserialize a stream written by a registry of version at most
    /// `expected_version`.
    pub fn deserialize(
        &self,
        bytes: &[u8],
        expected_version: u32,
        cancel: &CancellationToken,
    ) -> StubResult<StubTree> {
        let header = peek_header(bytes)?;
        self.registry.check_version(header.version, expected_version)?;

        let table_offset = header.string_table_offset;
        if table_offset > bytes.len() {
            return Err(StubError::TruncatedStream {
                offset: bytes.len(),
            });
        }
        if table_offset < header.frames_offset {
            return Err(StubError::PayloadMismatch(format!(
                "string table offset {table_offset} overlaps the header"
            )));
        }
        let strings = StubInputStream::read_string_table(bytes, table_offset)?;
        let mut input = StubInputStream::new(bytes, header.frames_offset, table_offset, strings);
        let mut assembler = StubTreeAssembler::new(Arc::clone(&self.registry));

        let (file_id, _) = self.registry.file_type()?;
        let root_offset = input.position();
        let root_type = input.read_u32()?;
        if root_type != file_id.0 {
            return Err(StubError::PayloadMismatch(format!(
                "root frame at {root_offset} has type {root_type}, expected file type {}",
                file_id.0
            )));
        }

        // (parent, children still to read)
        let mut stack: Vec<(StubId, u64)> = Vec::new();
        let mut next_type = Some((ElementTypeId(root_type), root_offset));
        loop {
            if cancel.is_cancelled() {
                return Err(StubError::Cancelled);
            }
            let (type_id, frame_offset) = match next_type.take() {
                Some(found) => found,
                None => {
                    let Some((_, remaining)) = stack.last_mut() else {
                        break;
                    };
                    if *remaining == 0 {
                        stack.pop();
                        continue;
                    }
                    *remaining -= 1;
                    let offset = input.position();
                    (ElementTypeId(input.read_u32()?), offset)
                }
            };

            let element_type = self.registry.lookup(type_id)?;
            if !element_type.is_stubbed() {
                return Err(StubError::PayloadMismatch(format!(
                    "frame at {frame_offset} has non-stubbed type {}",
                    element_type.debug_name()
                )));
            }
            let parent = stack.last().map(|(id, _)| *id);
            let payload = element_type.deserialize(
                &mut input,
                parent.and_then(|p| assembler.payload(p)),
            )?;
            let id = assembler.push(type_id, Arc::clone(element_type), parent, payload);

            let count_offset = input.position();
            let child_count = input.read_varuint()?;
            // Every child frame takes at least two bytes.
            if child_count.saturating_mul(2) > input.remaining() as u64 {
                return Err(StubError::TruncatedStream {
                    offset: count_offset,
                });
            }
            stack.push((id, child_count));
        }

        if input.remaining() != 0 {
            return Err(StubError::PayloadMismatch(format!(
                "{} unread bytes before the string table",
                input.remaining()
            )));
        }
        let unreferenced = input.unreferenced_strings();
        if unreferenced != 0 {
            return Err(StubError::PayloadMismatch(format!(
                "{unreferenced} string table entries are never referenced"
            )));
        }
        let tree = assembler.finish();
        debug!(
            stubs = tree.len(),
            version = header.version,
            "deserialized stub tree"
        );
        Ok(tree)
    }
}

/// Serialize with the process-wide registry.
pub fn serialize(tree: &StubTree) -> StubResult<Bytes> {
    StubSerializer::new(crate::registry::global()?).serialize(tree, &CancellationToken::new())
}

/// Deserialize with the process-wide registry.
pub fn deserialize(bytes: &[u8], expected_version: u32) -> StubResult<StubTree> {
    StubSerializer::new(crate::registry::global()?).deserialize(
        bytes,
        expected_version,
        &CancellationToken::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StubTreeBuilder;
    use crate::java;
    use pretty_assertions::assert_eq;
    use stubindex_ast::java::parse_java;

    fn setup(source: &str) -> (StubSerializer, StubTree) {
        let registry = Arc::new(java::registry().unwrap());
        let parsed = parse_java(source, &CancellationToken::new()).unwrap();
        let tree = StubTreeBuilder::new(Arc::clone(&registry))
            .build(&parsed, &CancellationToken::new())
            .unwrap();
        (StubSerializer::new(registry), tree)
    }

    #[test]
    fn test_header_layout() {
        let (serializer, tree) = setup("class A {}");
        let bytes = serializer.serialize(&tree, &CancellationToken::new()).unwrap();
        assert_eq!(&bytes[..4], b"STBB");
        let header = peek_header(&bytes).unwrap();
        assert_eq!(header.version, java::JAVA_STUB_VERSION);
        assert!(header.string_table_offset < bytes.len());
        assert_eq!(header.frames_offset, 6);
    }

    #[test]
    fn test_long_frame_region_offset() {
        let source: String = (0..40)
            .map(|i| format!("class C{i} {{ int f{i}; }}\n"))
            .collect();
        let (serializer, tree) = setup(&source);
        let bytes = serializer.serialize(&tree, &CancellationToken::new()).unwrap();
        let header = peek_header(&bytes).unwrap();
        assert!(header.string_table_offset > 127);
        let decoded = serializer
            .deserialize(&bytes, java::JAVA_STUB_VERSION, &CancellationToken::new())
            .unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let (serializer, tree) = setup("class A {}");
        let mut bytes = serializer
            .serialize(&tree, &CancellationToken::new())
            .unwrap()
            .to_vec();
        bytes.push(0);
        assert!(matches!(
            serializer.deserialize(&bytes, 1, &CancellationToken::new()),
            Err(StubError::PayloadMismatch(_))
        ));
    }

    #[test]
    fn test_unreferenced_table_entry_rejected() {
        let (serializer, tree) = setup("class A {}");
        let mut bytes = serializer
            .serialize(&tree, &CancellationToken::new())
            .unwrap()
            .to_vec();
        let offset = peek_header(&bytes).unwrap().string_table_offset;
        assert!(bytes[offset] < 0x7f);
        bytes[offset] += 1;
        bytes.extend_from_slice(&[2, b'z', b'z']);
        assert!(matches!(
            serializer.deserialize(&bytes, 1, &CancellationToken::new()),
            Err(StubError::PayloadMismatch(_))
        ));
    }

    #[test]
    fn test_accepted_streams_are_canonical() {
        let (serializer, tree) = setup(
            "package p;\n\
             import java.util.List;\n\
             @A(x = 1) class C<T> extends B implements I {\n\
             int f; void m(String a) throws E {}\n\
             }\n",
        );
        let token = CancellationToken::new();
        let original = serializer.serialize(&tree, &token).unwrap().to_vec();

        let mut candidates = Vec::new();
        for i in 0..original.len() {
            for value in [0x00, 0x01, 0x02, 0x7f, 0x80, 0xff, original[i] ^ 0x01] {
                let mut mutated = original.clone();
                mutated[i] = value;
                candidates.push(mutated);
            }
            candidates.push(original[..i].to_vec());
        }

        let mut accepted = 0;
        for bytes in candidates {
            if let Ok(decoded) = serializer.deserialize(&bytes, java::JAVA_STUB_VERSION, &token) {
                accepted += 1;
                assert_eq!(serializer.serialize(&decoded, &token).unwrap().to_vec(), bytes);
            }
        }
        // At least the unchanged stream is among the candidates.
        assert!(accepted > 0);
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(
            peek_header(b"NOPE\x01\x06"),
            Err(StubError::PayloadMismatch(_))
        ));
        assert!(matches!(
            peek_header(b"ST"),
            Err(StubError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_index_only_matches_serialize() {
        let (serializer, tree) = setup("package p; @A(x = 1) class C extends B { void m(int a) {} }");
        let token = CancellationToken::new();
        let (_, contributions) = serializer.serialize_with_index(&tree, &token).unwrap();
        assert_eq!(serializer.index_only(&tree, &token).unwrap(), contributions);
        assert!(!contributions.get("java.class.fqn", &"p.C".into()).is_empty());
    }

    #[test]
    fn test_cancelled_deserialize() {
        let (serializer, tree) = setup("class A {}");
        let bytes = serializer.serialize(&tree, &CancellationToken::new()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            serializer.deserialize(&bytes, 1, &token),
            Err(StubError::Cancelled)
        ));
    }
}
