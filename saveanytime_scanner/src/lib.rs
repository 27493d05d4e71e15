use std::{
    fmt::Display,
    fs::File,
    io::{self, Read},
    path::Path,
};

use anyhow::{bail, Result};
use memchr::memmem;

/// Size of each read when scanning a stream. Large enough that a typical executable is scanned
/// in a handful of reads.
pub const DEFAULT_CHUNK_SIZE: usize = 2048 * 2048;

/// A literal byte sequence to search for.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Pattern {
    sig: Vec<u8>,
}

impl Pattern {
    fn parse_hex_byte(s: &str) -> Option<u8> {
        if s.len() == 2 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            u8::from_str_radix(s, 16).ok()
        } else {
            None
        }
    }

    /// Parse a pattern from whitespace separated hex bytes, e.g. `"ff 90 70 01"`.
    pub fn new<S: AsRef<str>>(s: S) -> Result<Self> {
        let mut sig = vec![];
        for (i, w) in s.as_ref().split_whitespace().enumerate() {
            if let Some(b) = Self::parse_hex_byte(w) {
                sig.push(b);
            } else if w.contains('?') {
                bail!("wildcard \"{w}\" at word {i} is not supported, patterns are literal");
            } else {
                bail!("bad pattern word \"{w}\"");
            }
        }
        Self::from_bytes(sig)
    }

    pub fn from_bytes(sig: impl Into<Vec<u8>>) -> Result<Self> {
        let sig = sig.into();
        if sig.is_empty() {
            bail!("pattern must match at least one byte");
        }
        Ok(Self { sig })
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.sig.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.sig
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02X}", self.sig[0])?;
        for b in self.sig.iter().skip(1) {
            write!(f, " {:02X}", b)?;
        }
        Ok(())
    }
}
impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pattern(\"{self}\")")
    }
}

/// Searches a stream for the first occurrence of a [`Pattern`] without loading the whole stream
/// into memory.
///
/// The stream is read in chunks. The last `pattern.len() - 1` bytes seen are carried over and
/// prepended to the next chunk so a match straddling a chunk boundary is still found.
pub struct StreamScanner<'p> {
    pattern: &'p Pattern,
    chunk_size: usize,
}

impl<'p> StreamScanner<'p> {
    pub fn new(pattern: &'p Pattern) -> Self {
        Self {
            pattern,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read size. Values smaller than the pattern are raised to the pattern length.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Returns the absolute offset of the first match, or `None` if the stream ends without one.
    pub fn scan<R: Read>(&self, mut reader: R) -> io::Result<Option<u64>> {
        let len = self.pattern.len();
        let chunk_size = self.chunk_size.max(len);
        let finder = memmem::Finder::new(self.pattern.as_bytes());

        let mut buf = vec![0; chunk_size];
        let mut concat: Vec<u8> = Vec::with_capacity(chunk_size + len - 1);
        // stream position after the last read
        let mut position: u64 = 0;

        loop {
            let read = match reader.read(&mut buf) {
                Ok(0) => {
                    tracing::debug!(position, "end of stream, no match");
                    return Ok(None);
                }
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            position += read as u64;
            concat.extend_from_slice(&buf[..read]);

            if let Some(index) = finder.find(&concat) {
                let offset = position - concat.len() as u64 + index as u64;
                tracing::debug!(offset, "found {:?}", self.pattern);
                return Ok(Some(offset));
            }

            let keep = concat.len().min(len - 1);
            concat.drain(..concat.len() - keep);
        }
    }
}

/// Open `path` and scan it with the default chunk size. The file is closed before returning.
pub fn scan_file<P: AsRef<Path>>(pattern: &Pattern, path: P) -> io::Result<Option<u64>> {
    let file = File::open(path.as_ref())?;
    tracing::debug!("scanning {}", path.as_ref().display());
    StreamScanner::new(pattern).scan(file)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    /// Reader handing out at most `max` bytes per call and an interruption every other call.
    struct Trickle<'a> {
        data: &'a [u8],
        max: usize,
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::ErrorKind::Interrupted.into());
            }
            let n = self.max.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn needle() -> Pattern {
        Pattern::new("ff 90 70 01 00 00 83 7c 24 20 00 75 10").unwrap()
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Some(0xff), Pattern::parse_hex_byte("ff"));
        assert_eq!(Some(0x00), Pattern::parse_hex_byte("00"));
        assert_eq!(Some(0x7c), Pattern::parse_hex_byte("7C"));
        assert_eq!(None, Pattern::parse_hex_byte("z0"));
        assert_eq!(None, Pattern::parse_hex_byte("0"));
        assert_eq!(None, Pattern::parse_hex_byte("000"));
        assert_eq!(None, Pattern::parse_hex_byte("+f"));
    }

    #[test]
    fn test_build_pattern() {
        assert_eq!(
            Pattern::new("10 20 ff").unwrap(),
            Pattern::from_bytes(b"\x10\x20\xff".to_vec()).unwrap()
        );
        assert!(Pattern::new("").is_err());
        assert!(Pattern::from_bytes(Vec::<u8>::new()).is_err());
        assert!(Pattern::new("10 ?? 20").is_err());
        assert!(Pattern::new("10 | 20").is_err());
    }

    #[test]
    fn test_display_pattern() {
        assert_eq!(Pattern::new("12 ab 56").unwrap().to_string(), "12 AB 56");
        assert_eq!(
            format!("{:?}", Pattern::new("0f").unwrap()),
            "Pattern(\"0F\")"
        );
    }

    #[test]
    fn test_scan_not_found_is_not_zero() {
        let pattern = needle();
        let data = vec![0u8; 100];
        assert_eq!(
            None,
            StreamScanner::new(&pattern).scan(Cursor::new(&data)).unwrap()
        );
        assert_eq!(
            None,
            StreamScanner::new(&pattern).scan(io::empty()).unwrap()
        );

        let mut data = pattern.as_bytes().to_vec();
        data.extend([0; 50]);
        assert_eq!(
            Some(0),
            StreamScanner::new(&pattern)
                .chunk_size(16)
                .scan(Cursor::new(&data))
                .unwrap()
        );
    }

    #[test]
    fn test_scan_chunk_boundaries() {
        let pattern = needle();
        let len = pattern.len();

        for chunk_size in [len, len + 1, 2 * len - 1, 32, 64] {
            // place the pattern at every position around the first few chunk edges
            for edge in [chunk_size, 2 * chunk_size, 3 * chunk_size] {
                for k in edge - (len - 1).min(edge)..=edge + len - 1 {
                    let mut data = vec![0xcc; 4 * chunk_size + 2 * len];
                    data[k..k + len].copy_from_slice(pattern.as_bytes());

                    let found = StreamScanner::new(&pattern)
                        .chunk_size(chunk_size)
                        .scan(Cursor::new(&data))
                        .unwrap();
                    assert_eq!(Some(k as u64), found, "chunk_size={chunk_size} k={k}");
                }
            }
        }
    }

    #[test]
    fn test_scan_first_occurrence() {
        let pattern = needle();
        let mut data = vec![0; 200];
        data[150..163].copy_from_slice(pattern.as_bytes());
        data[40..53].copy_from_slice(pattern.as_bytes());
        assert_eq!(
            Some(40),
            StreamScanner::new(&pattern)
                .chunk_size(16)
                .scan(Cursor::new(&data))
                .unwrap()
        );
    }

    #[test]
    fn test_scan_short_reads() {
        let pattern = needle();
        let mut data = vec![0x75; 1000];
        data[777..790].copy_from_slice(pattern.as_bytes());

        for max in [1, 3, 7, 13, 100] {
            let reader = Trickle {
                data: &data,
                max,
                interrupt: false,
            };
            assert_eq!(
                Some(777),
                StreamScanner::new(&pattern).chunk_size(20).scan(reader).unwrap(),
                "max={max}"
            );
        }
    }

    #[test]
    fn test_scan_truncated_pattern_at_end() {
        let pattern = needle();
        let mut data = vec![0; 64];
        data.extend(&pattern.as_bytes()[..pattern.len() - 1]);
        assert_eq!(
            None,
            StreamScanner::new(&pattern)
                .chunk_size(16)
                .scan(Cursor::new(&data))
                .unwrap()
        );
    }

    #[test]
    fn test_scan_file() {
        let pattern = needle();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut data = vec![0; DEFAULT_CHUNK_SIZE + 2 * pattern.len()];
        let k = DEFAULT_CHUNK_SIZE - 6;
        assert!(k + pattern.len() > DEFAULT_CHUNK_SIZE);
        data[k..k + pattern.len()].copy_from_slice(pattern.as_bytes());
        io::Write::write_all(&mut file, &data).unwrap();

        assert_eq!(Some(k as u64), scan_file(&pattern, file.path()).unwrap());
    }

    #[test]
    fn test_scan_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_file(&needle(), dir.path().join("missing.exe")).unwrap_err();
        assert_eq!(io::ErrorKind::NotFound, err.kind());
    }
}
