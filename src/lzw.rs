//! Variable-width LZW compression
//!
//! The encoder walks a de-la-Briandais trie (`tools::dlb`) to find the
//! longest dictionary match for the unread input, one byte of lookahead at
//! a time. The decoder mirrors it with an index-addressable symbol table
//! backed by `(parent, last_byte)` links rather than owned strings, so that
//! reconstructing a codeword's string is a walk back to a seed byte instead
//! of a clone.
//!
//! Codeword width starts at `L_MIN` bits and grows to `L_MAX` as the
//! dictionary fills; past `L_MAX` the dictionary either freezes or, if the
//! caller opted in, resets to the seeded 256 single-byte keys. Both sides
//! must apply the exact same schedule or they desynchronize silently.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, ErrorKind, Read, Write};
use std::path::Path;

use crate::tools::bitio::{BitReader, BitWriter};
use crate::tools::dlb::Dictionary;
use crate::{Error, L_MAX, L_MIN, R};

const NIL: u32 = u32::MAX;

/// One entry in the decoder's symbol table: the string it represents is
/// `parent`'s string with `last_byte` appended, or just `[last_byte]` if
/// `parent == NIL`.
struct Entry {
    parent: u32,
    last_byte: u8,
}

/// Index-addressable decoder symbol table. Slots `0..R` are the seeded
/// single bytes, slot `R` is the unused empty-string placeholder reserving
/// the EOF code, and slots beyond that are appended in assignment order.
struct SymbolTable {
    entries: Vec<Entry>,
}

impl SymbolTable {
    fn new() -> Self {
        let mut entries = Vec::with_capacity(R + 1);
        for b in 0..256u32 {
            entries.push(Entry { parent: NIL, last_byte: b as u8 });
        }
        entries.push(Entry { parent: NIL, last_byte: 0 }); // slot R, never resolved
        Self { entries }
    }

    fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    fn reset(&mut self) {
        self.entries.truncate(R + 1);
    }

    fn push(&mut self, parent: u32, last_byte: u8) {
        self.entries.push(Entry { parent, last_byte });
    }

    /// Materializes the byte string for `code` by walking parent links into
    /// `scratch` and reversing; `code` must be `< self.len()`.
    fn resolve(&self, code: u32, scratch: &mut Vec<u8>) {
        scratch.clear();
        let mut c = code;
        loop {
            let e = &self.entries[c as usize];
            scratch.push(e.last_byte);
            if e.parent == NIL {
                break;
            }
            c = e.parent;
        }
        scratch.reverse();
    }
}

/// Compresses `input` into `output` using the variable-width LZW codec.
/// When `reset` is true, a full dictionary is discarded and reseeded once
/// codewords have widened to `L_MAX` and room runs out again; when false,
/// the dictionary freezes at that point and compression continues at fixed
/// width. Returns `(bytes_read, bytes_written)`.
pub fn compress<R2: Read, W: Write>(input: &mut R2, output: &mut W, reset: bool) -> Result<(u64, u64), Error> {
    let mut writer = BitWriter::new(output);
    let mut trie = Dictionary::new();

    let mut l = L_MIN;
    let mut n: u32 = 1 << l;
    let mut next_code: u32 = R as u32 + 1;

    writer.write_bit(reset as u8)?;

    let mut match_: Vec<u8> = Vec::new();
    let mut to_add: Vec<u8> = Vec::new();
    let mut bytes_in: u64 = 0;
    let mut sym = [0u8; 1];

    log::debug!("entering LZW encode loop, reset={}", reset);
    loop {
        match input.read_exact(&mut sym) {
            Ok(()) => bytes_in += 1,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::IoRead(e)),
        }
        let b = sym[0];
        to_add.push(b);

        if trie.is_prefix(&to_add) {
            match_ = to_add.clone();
            continue;
        }

        let code = trie.get(&match_).unwrap(); // match_ was just confirmed matchable, should never panic
        log::trace!("emit code {} at width {}", code, l);
        writer.write_bits(code as u32, l as usize)?;

        if next_code >= n && l < L_MAX {
            l += 1;
            n <<= 1;
            log::debug!("widen codewords to {} bits", l);
        }
        if next_code < n {
            trie.add(&to_add, next_code as i32);
            next_code += 1;
        } else if l == L_MAX && reset {
            log::debug!("dictionary full, resetting");
            trie.reset();
            l = L_MIN;
            n = 1 << l;
            next_code = R as u32 + 1;
        }

        match_ = vec![b];
        to_add = vec![b];
    }

    if !match_.is_empty() {
        let code = trie.get(&match_).unwrap(); // should never panic
        writer.write_bits(code as u32, l as usize)?;
    }
    writer.write_bits(R as u32, l as usize)?;
    writer.flush()?;
    log::debug!("encode finished, {} bytes in", bytes_in);

    Ok((bytes_in, writer.bytes_written()))
}

/// Decompresses `input` into `output`. Returns `(bytes_read, bytes_written)`.
pub fn decompress<R2: Read, W: Write>(input: &mut R2, output: &mut W) -> Result<(u64, u64), Error> {
    let mut reader = BitReader::new(input)?;
    let mut st = SymbolTable::new();

    let mut l = L_MIN;
    let mut n: u32 = 1 << l;
    let mut next_code: u32 = R as u32 + 1;

    let reset = reader.read_bit()? != 0;
    log::debug!("entering LZW decode loop, reset={}", reset);

    let mut scratch = Vec::new();
    let c0 = reader.read_bits(l as usize)?;
    if c0 as usize == R {
        // empty input: the encoder never emitted a match before the EOF
        // marker, so there is nothing to read past it either
        output.flush().map_err(Error::IoWrite)?;
        log::debug!("decode finished, empty stream");
        return Ok((reader.bytes_read(), 0));
    }
    if c0 >= st.len() {
        return Err(Error::MalformedStream(format!("initial codeword {} is out of range", c0)));
    }
    st.resolve(c0, &mut scratch);
    output.write_all(&scratch).map_err(Error::IoWrite)?;
    let mut bytes_out: u64 = scratch.len() as u64;
    let mut val = scratch.clone();
    let mut val_code = c0;

    loop {
        let c = reader.read_bits(l as usize)?;
        if c as usize == R {
            break;
        }

        let s: Vec<u8> = if c == st.len() {
            // KwKwK: the codeword names the very slot about to be assigned
            let mut s = val.clone();
            s.push(val[0]);
            s
        } else if c < st.len() {
            let mut tmp = Vec::new();
            st.resolve(c, &mut tmp);
            tmp
        } else {
            return Err(Error::MalformedStream(format!(
                "codeword {} exceeds next assignable code {}",
                c,
                st.len()
            )));
        };

        if next_code < n {
            st.push(val_code, s[0]);
            next_code += 1;
        }

        log::trace!("emit {:?} for code {}", s, c);
        output.write_all(&s).map_err(Error::IoWrite)?;
        bytes_out += s.len() as u64;
        val = s;
        val_code = c;

        if next_code >= n && l < L_MAX {
            l += 1;
            n <<= 1;
            log::debug!("widen codewords to {} bits", l);
        } else if l == L_MAX && next_code >= n && reset {
            log::debug!("dictionary full, resetting");
            st.reset();
            l = L_MIN;
            n = 1 << l;
            next_code = R as u32 + 1;

            let extra = reader.read_bits(l as usize)?;
            if extra >= st.len() {
                return Err(Error::MalformedStream(format!("post-reset codeword {} is out of range", extra)));
            }
            st.resolve(extra, &mut scratch);
            output.write_all(&scratch).map_err(Error::IoWrite)?;
            bytes_out += scratch.len() as u64;
            val = scratch.clone();
            val_code = extra;
        }
    }

    output.flush().map_err(Error::IoWrite)?;
    log::debug!("decode finished, {} bytes out", bytes_out);
    Ok((reader.bytes_read(), bytes_out))
}

/// Compresses `path`, writing the result alongside it with its extension
/// replaced by [`crate::EXT_COMPRESSED`].
pub fn compress_file(path: &Path, reset: bool) -> Result<(u64, u64), Error> {
    let mut reader = BufReader::new(File::open(path).map_err(Error::IoOpen)?);
    let out_path = path.with_extension(crate::EXT_COMPRESSED);
    let mut writer = BufWriter::new(File::create(out_path).map_err(Error::IoOpen)?);
    let counts = compress(&mut reader, &mut writer, reset)?;
    writer.flush().map_err(Error::IoWrite)?;
    Ok(counts)
}

/// Decompresses `path`, writing the result alongside it with its extension
/// replaced by [`crate::EXT_EXPANDED`].
pub fn decompress_file(path: &Path) -> Result<(u64, u64), Error> {
    let mut reader = BufReader::new(File::open(path).map_err(Error::IoOpen)?);
    let out_path = path.with_extension(crate::EXT_EXPANDED);
    let mut writer = BufWriter::new(File::create(out_path).map_err(Error::IoOpen)?);
    let counts = decompress(&mut reader, &mut writer)?;
    writer.flush().map_err(Error::IoWrite)?;
    Ok(counts)
}

/// Convenience function, calls `compress` with a slice returning a `Vec`.
pub fn compress_slice(data: &[u8], reset: bool) -> Result<Vec<u8>, Error> {
    let mut src = Cursor::new(data);
    let mut dst = Vec::new();
    compress(&mut src, &mut dst, reset)?;
    Ok(dst)
}

/// Convenience function, calls `decompress` with a slice returning a `Vec`.
pub fn decompress_slice(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut src = Cursor::new(data);
    let mut dst = Vec::new();
    decompress(&mut src, &mut dst)?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8], reset: bool) {
        let compressed = compress_slice(data, reset).expect("compression failed");
        let expanded = decompress_slice(&compressed).expect("decompression failed");
        assert_eq!(expanded, data);
    }

    #[test]
    fn empty_input_is_just_the_eof_marker() {
        let compressed = compress_slice(&[], false).expect("compression failed");
        // 1 reset bit + 9 bit EOF codeword = 10 bits, padded to 2 bytes
        assert_eq!(compressed.len(), 2);
        let expanded = decompress_slice(&compressed).expect("decompression failed");
        assert!(expanded.is_empty());
    }

    #[test]
    fn roundtrip_tobeornot() {
        roundtrip(b"TOBEORNOTTOBEORTOBEORNOT", false);
        roundtrip(b"TOBEORNOTTOBEORTOBEORNOT", true);
    }

    #[test]
    fn tobeornot_matches_literal_wire_format() {
        // codes T,O,B,E,O,R,N,O,T,TO,OB,BE,EO,OR,RN,NO,EOF at L_MIN=9 bits,
        // reset=false, verified by hand against a reference trace
        let compressed = compress_slice(b"TOBEORNOTTOBEORTOBEORNOT", false).expect("compression failed");
        let expected = hex::decode("1509e422293ca44e27952030382c2a0906844000").unwrap();
        assert_eq!(compressed, expected);
    }

    #[test]
    fn roundtrip_single_byte() {
        roundtrip(&[0u8], false);
        roundtrip(&[0xffu8], true);
    }

    #[test]
    fn roundtrip_exercises_kwkwk_case() {
        // "aaaaaa" forces the decoder to see a codeword equal to its own next_code
        roundtrip(b"aaaaaa", false);
        roundtrip(b"aaaaaa", true);
    }

    #[test]
    fn single_byte_stream_matches_wire_format() {
        // reset bit (0) + code 0 at 9 bits + EOF (256) at 9 bits, zero padded
        let compressed = compress_slice(&[0u8], false).expect("compression failed");
        let mut reader = BitReader::new(Cursor::new(&compressed)).unwrap();
        assert_eq!(reader.read_bit().unwrap(), 0);
        assert_eq!(reader.read_bits(9).unwrap(), 0);
        assert_eq!(reader.read_bits(9).unwrap(), R as u32);
    }

    #[test]
    fn width_grows_to_l_max_without_reset_and_then_freezes() {
        // enough distinct two-byte runs to exhaust the dictionary before 16 bits
        let mut data = Vec::new();
        for hi in 0..=255u16 {
            for lo in 0..=255u16 {
                data.push(hi as u8);
                data.push(lo as u8);
                if data.len() > 70_000 {
                    break;
                }
            }
            if data.len() > 70_000 {
                break;
            }
        }
        roundtrip(&data, false);
    }

    #[test]
    fn reset_policy_reclaims_dictionary_on_large_input() {
        let mut data = Vec::with_capacity(200_000);
        let mut state: u32 = 12345;
        for _ in 0..200_000 {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            data.push((state >> 16) as u8);
        }
        roundtrip(&data, true);
    }

    #[test]
    fn truncated_stream_errors_instead_of_panicking() {
        let compressed = compress_slice(b"TOBEORNOTTOBEORTOBEORNOT", false).expect("compression failed");
        let truncated = &compressed[..compressed.len() - 1];
        let result = decompress_slice(truncated);
        assert!(result.is_err());
    }

    #[test]
    fn codeword_beyond_next_code_is_malformed() {
        // 1 reset bit (0) then a 9-bit codeword of 500, which is far beyond
        // next_code=257 at stream start
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(0).unwrap();
        writer.write_bits(500, 9).unwrap();
        writer.write_bits(R as u32, 9).unwrap();
        let bytes = writer.close().unwrap();
        let result = decompress_slice(&bytes);
        assert!(matches!(result, Err(Error::MalformedStream(_))));
    }
}
