//! Pull-style DER decoding.
//!
//! [`Decoder`] walks a byte range and yields [`Event`]s in document order:
//!
//! ```text
//! Start(SET)
//!   Start(SEQUENCE)
//!     Start(INTEGER) Value(range) End(INTEGER)
//!   End(SEQUENCE)
//! End(SET)
//! ```
//!
//! Constructed nodes are descended into; primitive nodes yield their content
//! range. Every header is checked against the enclosing node before anything
//! is read from it, so a truncated document fails without reading past its
//! end. After the first error the decoder is fused.
//!
//! The cursor helpers ([`Decoder::next_child`], [`Decoder::expect_child`],
//! [`Decoder::skip_to_end`]) consume the same event stream one sibling at a
//! time, which is what the receipt models use.

use std::collections::VecDeque;

use crate::error::DecodeError;
use crate::source::{check_bounds, ByteSource};
use crate::tag::{ByteRange, Node, Tag, TagClass};

/// Default cap on constructed nesting.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Length fields longer than this cannot describe a `u64`.
const MAX_LENGTH_OCTETS: u64 = 8;

/// Limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderLimits {
    /// Maximum number of simultaneously open constructed nodes.
    pub max_depth: usize,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One step of the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A node's header has been read.
    Start(Node),
    /// Content of the primitive node that just started.
    Value(ByteRange),
    /// The node (and all of its children) is complete.
    End(Node),
}

/// Decode the tag and length at `offset`.
///
/// `limit` is the exclusive end of the enclosing content; neither the header
/// nor the declared content may extend past it.
pub fn decode_header<S: ByteSource + ?Sized>(
    source: &S,
    offset: u64,
    limit: u64,
) -> Result<Node, DecodeError> {
    let mut pos = offset;

    let first = read_byte(source, &mut pos, limit)?;
    let class = TagClass::from_bits(first >> 6);
    let constructed = first & 0x20 != 0;
    let mut number = u32::from(first & 0x1f);

    // Long-form tag: base-128 digits, high bit set on all but the last.
    if number == 0x1f {
        number = 0;
        loop {
            let byte = read_byte(source, &mut pos, limit)?;
            if number > (u32::MAX >> 7) {
                return Err(DecodeError::MalformedTag { offset });
            }
            number = (number << 7) | u32::from(byte & 0x7f);
            if byte & 0x80 == 0 {
                break;
            }
        }
    }

    let length_offset = pos;
    let first_length = read_byte(source, &mut pos, limit)?;
    let length = if first_length & 0x80 == 0 {
        u64::from(first_length)
    } else {
        let count = u64::from(first_length & 0x7f);
        if count == 0 {
            return Err(DecodeError::MalformedLength {
                offset: length_offset,
                reason: "indefinite length is not allowed in DER",
            });
        }
        if count > MAX_LENGTH_OCTETS || count > limit - pos {
            return Err(DecodeError::MalformedLength {
                offset: length_offset,
                reason: "length octets overflow the remaining buffer",
            });
        }
        let octets = source.read(ByteRange::new(pos, count))?;
        pos += count;
        octets
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
    };

    let available = limit - pos;
    if length > available {
        return Err(DecodeError::TruncatedData {
            offset: pos,
            needed: length,
            available,
        });
    }

    Ok(Node {
        tag: Tag {
            class,
            constructed,
            number,
        },
        header_offset: offset,
        content: ByteRange::new(pos, length),
    })
}

fn read_byte<S: ByteSource + ?Sized>(
    source: &S,
    pos: &mut u64,
    limit: u64,
) -> Result<u8, DecodeError> {
    if *pos >= limit {
        return Err(DecodeError::TruncatedData {
            offset: *pos,
            needed: 1,
            available: 0,
        });
    }
    let bytes = source.read(ByteRange::new(*pos, 1))?;
    *pos += 1;
    Ok(bytes[0])
}

/// Pull-style decoder over one byte range of a source.
pub struct Decoder<'s, S: ByteSource + ?Sized> {
    source: &'s S,
    limits: DecoderLimits,
    pos: u64,
    end: u64,
    /// Constructed nodes whose `End` has not been emitted yet.
    open: Vec<Node>,
    /// `Value` and `End` of the primitive node that just started.
    queued: VecDeque<Event>,
    fused: bool,
}

impl<'s, S: ByteSource + ?Sized> Decoder<'s, S> {
    /// Decode the whole source.
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            limits: DecoderLimits::default(),
            pos: 0,
            end: source.len(),
            open: Vec::new(),
            queued: VecDeque::with_capacity(2),
            fused: false,
        }
    }

    /// Decode only `range`, which must lie within the source.
    pub fn with_range(source: &'s S, range: ByteRange) -> Result<Self, DecodeError> {
        check_bounds(range, source.len())?;
        let mut decoder = Self::new(source);
        decoder.pos = range.offset;
        decoder.end = range.end();
        Ok(decoder)
    }

    /// Replace the default limits.
    pub fn limits(mut self, limits: DecoderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Current nesting depth (open constructed nodes).
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Next event, `Ok(None)` once the range is exhausted.
    pub fn next_event(&mut self) -> Result<Option<Event>, DecodeError> {
        if self.fused {
            return Ok(None);
        }
        let result = self.step();
        if result.is_err() {
            self.fused = true;
            self.open.clear();
            self.queued.clear();
        }
        result
    }

    fn step(&mut self) -> Result<Option<Event>, DecodeError> {
        if let Some(event) = self.queued.pop_front() {
            return Ok(Some(event));
        }

        let parent_end = self.open.last().map(|parent| parent.content.end());
        let limit = match parent_end {
            Some(end) if self.pos >= end => return Ok(self.open.pop().map(Event::End)),
            Some(end) => end,
            None if self.pos >= self.end => return Ok(None),
            None => self.end,
        };

        let node = decode_header(self.source, self.pos, limit)?;
        if node.is_constructed() {
            if self.open.len() >= self.limits.max_depth {
                return Err(DecodeError::DepthExceeded {
                    offset: node.header_offset,
                    max: self.limits.max_depth,
                });
            }
            self.pos = node.content.offset;
            self.open.push(node);
        } else {
            self.pos = node.content.end();
            self.queued.push_back(Event::Value(node.content));
            self.queued.push_back(Event::End(node));
        }
        Ok(Some(Event::Start(node)))
    }

    /// Next sibling at the current level.
    ///
    /// Returns `Ok(None)` when the enclosing node ends (its `End` is
    /// consumed) or the range is exhausted. A returned constructed node is
    /// left open: read its children with further calls, or close it with
    /// [`Decoder::skip_to_end`].
    pub fn next_child(&mut self) -> Result<Option<Node>, DecodeError> {
        loop {
            match self.next_event()? {
                None | Some(Event::End(_)) => return Ok(None),
                Some(Event::Start(node)) => {
                    if !node.is_constructed() {
                        self.queued.clear();
                    }
                    return Ok(Some(node));
                }
                Some(Event::Value(_)) => continue,
            }
        }
    }

    /// Next sibling, which must carry `tag`.
    pub fn expect_child(&mut self, tag: Tag) -> Result<Node, DecodeError> {
        match self.next_child()? {
            Some(node) if node.tag == tag => Ok(node),
            Some(node) => Err(DecodeError::UnexpectedNode {
                offset: node.header_offset,
                expected: tag,
                found: node.tag,
            }),
            None => Err(DecodeError::UnexpectedEnd { expected: tag }),
        }
    }

    /// Close the innermost open node without visiting its remaining children.
    pub fn skip_to_end(&mut self) -> Result<(), DecodeError> {
        self.queued.clear();
        match self.open.pop() {
            Some(node) => self.pos = node.content.end(),
            None => self.pos = self.end,
        }
        Ok(())
    }
}

impl<'s, S: ByteSource + ?Sized> Iterator for Decoder<'s, S> {
    type Item = Result<Event, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

/// Decode an entire source into its event list.
///
/// Either every event is returned or none are.
pub fn decode_all<S: ByteSource + ?Sized>(
    source: &S,
    limits: DecoderLimits,
) -> Result<Vec<Event>, DecodeError> {
    Decoder::new(source).limits(limits).collect()
}
