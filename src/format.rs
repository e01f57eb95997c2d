//! Tagged, checksummed section container shared by the model and gazetteer
//! files.
//!
//! ```text
//! magic[4] | version u32 | n_sections u32
//! ( tag[4] | len u64 | fnv1a32 u32 | payload[len] ) * n_sections
//! ```
//!
//! All integers are little endian.

use crate::error::{Error, Result};

pub const FORMAT_VERSION: u32 = 1;

pub(crate) type SectionTag = [u8; 4];

pub(crate) const TAG_LABELS: SectionTag = *b"LBLS";
pub(crate) const TAG_FEATURES: SectionTag = *b"FEAT";
pub(crate) const TAG_WEIGHTS: SectionTag = *b"WGHT";
pub(crate) const TAG_VOCAB: SectionTag = *b"VOCB";
pub(crate) const TAG_PHRASES: SectionTag = *b"PHRS";

const HEADER_SIZE: usize = 12;
const SECTION_HEADER_SIZE: usize = 16;

/// 32-bit FNV-1a.
pub(crate) fn checksum(data: &[u8]) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for &b in data {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}

fn tag_name(tag: &SectionTag) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

pub(crate) fn write_container(magic: &[u8; 4], sections: &[(SectionTag, Vec<u8>)]) -> Vec<u8> {
    let total: usize = sections.iter().map(|(_, p)| SECTION_HEADER_SIZE + p.len()).sum();
    let mut out = Vec::with_capacity(HEADER_SIZE + total);
    out.extend_from_slice(magic);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(sections.len() as u32).to_le_bytes());
    for (tag, payload) in sections {
        out.extend_from_slice(tag);
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(&checksum(payload).to_le_bytes());
        out.extend_from_slice(payload);
    }
    out
}

/// Splits a container into its section payloads, in the order of `expected`.
///
/// Every section must be present exactly in that order, pass its checksum,
/// and the buffer must end right after the last one.
pub(crate) fn read_container<'a>(
    magic: &[u8; 4],
    buffer: &'a [u8],
    expected: &[SectionTag],
) -> Result<Vec<&'a [u8]>> {
    let mut rdr = ByteReader::new(buffer, "header");
    if rdr.take(4)? != magic {
        return Err(Error::invalid_model(format!(
            "bad magic, expected {:?}",
            tag_name(magic)
        )));
    }
    let version = rdr.read_u32()?;
    if version != FORMAT_VERSION {
        return Err(Error::VersionMismatch { expected: FORMAT_VERSION, found: version });
    }
    let n_sections = rdr.read_u32()? as usize;
    if n_sections != expected.len() {
        return Err(Error::invalid_model(format!(
            "expected {} sections, found {}",
            expected.len(),
            n_sections
        )));
    }

    let mut sections = Vec::with_capacity(n_sections);
    for tag in expected {
        rdr.what = "section header";
        let found = rdr.read_tag()?;
        if &found != tag {
            return Err(Error::invalid_model(format!(
                "expected section {}, found {}",
                tag_name(tag),
                tag_name(&found)
            )));
        }
        let len = rdr.read_u64()?;
        let sum = rdr.read_u32()?;
        let len: usize = len
            .try_into()
            .map_err(|_| Error::invalid_model(format!("section {} too large", tag_name(tag))))?;
        rdr.what = "section payload";
        let payload = rdr.take(len)?;
        if checksum(payload) != sum {
            return Err(Error::invalid_model(format!(
                "checksum mismatch in section {}",
                tag_name(tag)
            )));
        }
        sections.push(payload);
    }
    rdr.what = "container";
    rdr.finish()?;
    Ok(sections)
}

/// Bounds-checked little-endian cursor. Running out of bytes is reported as
/// a truncated model.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    pub(crate) what: &'static str,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8], what: &'static str) -> Self {
        Self { buf, pos: 0, what }
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| Error::invalid_model(format!("truncated {}", self.what)))?;
        let s = &self.buf[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        let mut a = [0u8; 8];
        a.copy_from_slice(b);
        Ok(u64::from_le_bytes(a))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub(crate) fn read_tag(&mut self) -> Result<SectionTag> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Length-prefixed (u64) byte block.
    pub(crate) fn read_block(&mut self) -> Result<&'a [u8]> {
        let len: usize = self
            .read_u64()?
            .try_into()
            .map_err(|_| Error::invalid_model(format!("oversized block in {}", self.what)))?;
        self.take(len)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn finish(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::invalid_model(format!(
                "{} trailing bytes after {}",
                self.remaining(),
                self.what
            )));
        }
        Ok(())
    }
}

pub(crate) fn put_block(out: &mut Vec<u8>, block: &[u8]) {
    out.extend_from_slice(&(block.len() as u64).to_le_bytes());
    out.extend_from_slice(block);
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGIC: &[u8; 4] = b"tEST";

    #[test]
    fn container_round_trip() {
        let buf = write_container(MAGIC, &[(TAG_VOCAB, vec![1, 2, 3]), (TAG_PHRASES, vec![])]);
        let sections = read_container(MAGIC, &buf, &[TAG_VOCAB, TAG_PHRASES]).unwrap();
        assert_eq!(sections, vec![&[1u8, 2, 3][..], &[][..]]);
    }

    #[test]
    fn rejects_damage() {
        let buf = write_container(MAGIC, &[(TAG_VOCAB, vec![1, 2, 3])]);

        let truncated = &buf[..buf.len() - 1];
        match read_container(MAGIC, truncated, &[TAG_VOCAB]) {
            Err(Error::InvalidModel(msg)) => assert!(msg.contains("truncated"), "{msg}"),
            other => panic!("unexpected {:?}", other),
        }

        let mut corrupt = buf.clone();
        *corrupt.last_mut().unwrap() ^= 0xff;
        match read_container(MAGIC, &corrupt, &[TAG_VOCAB]) {
            Err(Error::InvalidModel(msg)) => assert!(msg.contains("checksum"), "{msg}"),
            other => panic!("unexpected {:?}", other),
        }

        let mut versioned = buf.clone();
        versioned[4..8].copy_from_slice(&7u32.to_le_bytes());
        match read_container(MAGIC, &versioned, &[TAG_VOCAB]) {
            Err(Error::VersionMismatch { expected, found }) => {
                assert_eq!(expected, FORMAT_VERSION);
                assert_eq!(found, 7);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(read_container(b"nope", &buf, &[TAG_VOCAB]).is_err());
        assert!(read_container(MAGIC, &buf, &[TAG_PHRASES]).is_err());

        let mut trailing = buf;
        trailing.push(0);
        assert!(read_container(MAGIC, &trailing, &[TAG_VOCAB]).is_err());
    }

    #[test]
    fn fnv_reference_values() {
        assert_eq!(checksum(b""), 0x811c_9dc5);
        assert_eq!(checksum(b"a"), 0xe40c_292c);
    }
}
