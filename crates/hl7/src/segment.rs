//! Positional segment and message builders.
//!
//! HL7 v2 receivers read fields by position. [`Segment`] lets encoders address fields by
//! their 1-based number, mirroring how each receiver's layout is documented (`PID-3`,
//! `OBX-11`, ...), instead of counting pipes by hand.
//!
//! MSH is numbered from the encoding characters: position 1 of an MSH [`Segment`] holds
//! `^~\&`, which HL7 calls MSH-2.

/// Field separator.
pub const FIELD_SEPARATOR: char = '|';

/// Component separator.
pub const COMPONENT_SEPARATOR: char = '^';

/// Repetition separator.
pub const REPETITION_SEPARATOR: char = '~';

/// Sub-component separator.
pub const SUBCOMPONENT_SEPARATOR: char = '&';

/// Encoding characters declared in MSH.
pub const ENCODING_CHARACTERS: &str = "^~\\&";

/// Segment terminator used by all three receivers.
pub const SEGMENT_TERMINATOR: char = '\n';

/// Joins parts into a composite field (`a^b^c`). Empty parts are kept as empty components.
pub fn component<S: AsRef<str>>(parts: &[S]) -> String {
    join(parts, COMPONENT_SEPARATOR)
}

/// Joins parts into a sub-component group (`a&b`).
pub fn subcomponent<S: AsRef<str>>(parts: &[S]) -> String {
    join(parts, SUBCOMPONENT_SEPARATOR)
}

/// Joins parts into a repeated field (`a~b`).
pub fn repetition<S: AsRef<str>>(parts: &[S]) -> String {
    join(parts, REPETITION_SEPARATOR)
}

fn join<S: AsRef<str>>(parts: &[S], separator: char) -> String {
    let mut out = String::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            out.push(separator);
        }
        out.push_str(part.as_ref());
    }
    out
}

/// One message line: a segment ID followed by positional fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    id: &'static str,
    fields: Vec<String>,
}

impl Segment {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            fields: Vec::new(),
        }
    }

    /// Pads the segment so that it renders at least `len` fields.
    ///
    /// Receivers that expect trailing empty fields (`...||||`) need this.
    pub fn with_len(mut self, len: usize) -> Self {
        if self.fields.len() < len {
            self.fields.resize(len, String::new());
        }
        self
    }

    /// Sets field `position` (1-based). Fields before it that were never set stay empty.
    pub fn set(mut self, position: usize, value: impl Into<String>) -> Self {
        debug_assert!(position > 0, "HL7 field positions start at 1");
        let idx = position.saturating_sub(1);
        if self.fields.len() <= idx {
            self.fields.resize(idx + 1, String::new());
        }
        self.fields[idx] = value.into();
        self
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Returns field `position` (1-based), or `None` beyond the last rendered field.
    pub fn field(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|idx| self.fields.get(idx))
            .map(String::as_str)
    }

    /// Appends the segment, including its terminator, to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push_str(self.id);
        for field in &self.fields {
            out.push(FIELD_SEPARATOR);
            out.push_str(field);
        }
        out.push(SEGMENT_TERMINATOR);
    }
}

/// An ordered list of segments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    segments: Vec<Segment>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Renders every segment, each terminated by [`SEGMENT_TERMINATOR`].
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            segment.write_to(&mut out);
        }
        out
    }
}
