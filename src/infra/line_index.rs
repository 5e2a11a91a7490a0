//! Newline index with offset→line mapping for scanned text.
//!
//! Goals
//! - Single pass over bytes to record '\n' positions.
//! - 1-based external line numbers (what every record reports).
//! - Binary search for offset→line mapping.
//!
//! Notes
//! - An offset that sits *on* a '\n' belongs to the line that newline ends.
//! - An empty buffer still answers line 1 for offset 0 (every file has a
//!   first line as far as record line numbers are concerned).
//! - Offsets are byte offsets into the analyzed `&str`.

#[derive(Debug, Clone)]
pub struct NewlineIndex
{
    /// Byte positions of every '\n' in the buffer.
    nl_positions: Vec<usize>,
}

impl NewlineIndex
{
    /// Build an index recording positions of '\n'.
    pub fn build(text: &str) -> Self
    {
        let bytes = text.as_bytes();
        let mut nl_positions = Vec::with_capacity(bytes.len() / 48);
        let mut i = 0usize;

        // Single pass; record every '\n' offset.
        while let Some(pos) = memchr::memchr(b'\n', &bytes[i..])
        {
            let abs = i + pos;
            nl_positions.push(abs);
            i = abs + 1;
        }

        Self { nl_positions }
    }

    /// 1-based line number covering the given byte offset.
    ///
    /// Lowest `i` such that `nl_positions[i] >= offset`, plus one.
    pub fn line_of(
        &self,
        offset: usize,
    ) -> usize
    {
        self.nl_positions
            .partition_point(|&nl| nl < offset)
            + 1
    }
}
