use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// Raw bytes of one source file. Never assumed to be UTF-8.
pub enum SourceBytes {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl AsRef<[u8]> for SourceBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            SourceBytes::Mapped(mmap) => &mmap[..],
            SourceBytes::Buffered(v) => v.as_slice(),
        }
    }
}

/// Read a file's raw bytes, memory-mapping anything over 1 MiB.
pub fn read_source<P: AsRef<Path>>(path: P) -> io::Result<SourceBytes> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)?;

    if metadata.len() > MMAP_THRESHOLD {
        let file = File::open(path)?;

        // Safety: We're only reading the file, not modifying it
        let mmap = unsafe { Mmap::map(&file) }?;

        Ok(SourceBytes::Mapped(mmap))
    } else {
        Ok(SourceBytes::Buffered(std::fs::read(path)?))
    }
}

/// Decode bytes as Latin-1: every byte maps to the char with the same code
/// point, so no input is ever rejected. ASCII bytes keep their offsets;
/// bytes >= 0x80 become two-byte UTF-8 sequences.
pub fn decode_latin1(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 8);
    out.extend(bytes.iter().map(|&b| char::from(b)));
    out
}
