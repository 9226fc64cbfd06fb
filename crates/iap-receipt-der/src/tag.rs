//! Tags, byte ranges, and decoded nodes.
//!
//! A [`Node`] never owns bytes. It records where its content lives in the
//! source so that callers can read exactly what they need.

use std::fmt;

/// The two class bits of an identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl TagClass {
    /// Decode from the top two bits of an identifier octet.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Universal,
            1 => Self::Application,
            2 => Self::ContextSpecific,
            _ => Self::Private,
        }
    }
}

/// A decoded identifier: class, constructed flag, and tag number.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub class: TagClass,
    pub constructed: bool,
    pub number: u32,
}

impl Tag {
    pub const BOOLEAN: Self = Self::universal(1, false);
    pub const INTEGER: Self = Self::universal(2, false);
    pub const OCTET_STRING: Self = Self::universal(4, false);
    pub const NULL: Self = Self::universal(5, false);
    pub const OBJECT_IDENTIFIER: Self = Self::universal(6, false);
    pub const UTF8_STRING: Self = Self::universal(12, false);
    pub const SEQUENCE: Self = Self::universal(16, true);
    pub const SET: Self = Self::universal(17, true);
    pub const PRINTABLE_STRING: Self = Self::universal(19, false);
    pub const IA5_STRING: Self = Self::universal(22, false);
    pub const UTC_TIME: Self = Self::universal(23, false);
    pub const GENERALIZED_TIME: Self = Self::universal(24, false);

    /// A universal-class tag.
    pub const fn universal(number: u32, constructed: bool) -> Self {
        Self {
            class: TagClass::Universal,
            constructed,
            number,
        }
    }

    /// A context-specific tag, e.g. `[0] EXPLICIT`.
    pub const fn context(number: u32, constructed: bool) -> Self {
        Self {
            class: TagClass::ContextSpecific,
            constructed,
            number,
        }
    }

    /// True for the character-string types accepted as text.
    pub fn is_string(&self) -> bool {
        matches!(
            *self,
            Self::UTF8_STRING | Self::IA5_STRING | Self::PRINTABLE_STRING
        )
    }

    fn universal_name(&self) -> Option<&'static str> {
        if self.class != TagClass::Universal {
            return None;
        }
        let name = match self.number {
            1 => "BOOLEAN",
            2 => "INTEGER",
            4 => "OCTET STRING",
            5 => "NULL",
            6 => "OBJECT IDENTIFIER",
            12 => "UTF8String",
            16 => "SEQUENCE",
            17 => "SET",
            19 => "PrintableString",
            22 => "IA5String",
            23 => "UTCTime",
            24 => "GeneralizedTime",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form = if self.constructed { "constructed" } else { "primitive" };
        match (self.class, self.universal_name()) {
            (_, Some(name)) => write!(f, "{} ({})", name, form),
            (TagClass::Universal, None) => write!(f, "UNIVERSAL {} ({})", self.number, form),
            (TagClass::Application, _) => write!(f, "[APPLICATION {}] ({})", self.number, form),
            (TagClass::ContextSpecific, _) => write!(f, "[{}] ({})", self.number, form),
            (TagClass::Private, _) => write!(f, "[PRIVATE {}] ({})", self.number, form),
        }
    }
}

/// A half-open byte range `[offset, offset + length)` within a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset. Saturates rather than wrapping.
    pub const fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }

    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// True if `other` lies entirely within `self`.
    pub const fn contains(&self, other: &ByteRange) -> bool {
        other.offset >= self.offset && other.end() <= self.end()
    }
}

/// One decoded tag/length/value triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub tag: Tag,
    /// Offset of the identifier octet.
    pub header_offset: u64,
    /// Where the content octets live.
    pub content: ByteRange,
}

impl Node {
    pub fn is_constructed(&self) -> bool {
        self.tag.constructed
    }

    /// Header plus content.
    pub fn full_range(&self) -> ByteRange {
        ByteRange::new(self.header_offset, self.content.end() - self.header_offset)
    }

    pub fn header_len(&self) -> u64 {
        self.content.offset - self.header_offset
    }
}
