use std::iter::FusedIterator;

/// A contiguous slice of the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// 1-based position in the document.
    pub ordinal: usize,
    /// Start offset in characters.
    pub offset: usize,
    pub text: &'a str,
}

/// Fixed-stride character chunks. Splits may land mid-word.
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    rest: &'a str,
    chunk_size: usize,
    next_ordinal: usize,
    remaining: usize,
}

pub fn chunks(text: &str, chunk_size: usize) -> Chunks<'_> {
    let chunk_size = chunk_size.max(1);
    let total_chars = text.chars().count();
    Chunks {
        rest: text,
        chunk_size,
        next_ordinal: 1,
        remaining: total_chars.div_ceil(chunk_size),
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let split = self
            .rest
            .char_indices()
            .nth(self.chunk_size)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (text, rest) = self.rest.split_at(split);
        let chunk = Chunk {
            ordinal: self.next_ordinal,
            offset: (self.next_ordinal - 1) * self.chunk_size,
            text,
        };
        self.rest = rest;
        self.next_ordinal += 1;
        self.remaining -= 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}
impl FusedIterator for Chunks<'_> {}
