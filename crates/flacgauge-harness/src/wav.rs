//! Raw PCM extraction from WAV containers.
//!
//! The comparison path only cares about the sample bytes, so this walks the
//! RIFF chunk list and returns the `data` chunk payload verbatim, ignoring
//! `fmt ` and any other metadata chunks. Chunk order beyond the two leading
//! tags is not assumed.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

/// Errors from WAV payload extraction.
#[derive(Debug, Error)]
pub enum WavError {
    /// Outer container tag is not `RIFF`.
    #[error("not a RIFF container")]
    InvalidRiffTag,

    /// Format tag is not `WAVE`.
    #[error("RIFF container is not WAVE format")]
    InvalidWaveTag,

    /// End of input reached before a `data` chunk was found.
    #[error("no data chunk found")]
    MissingDataChunk,

    /// Read or seek fault while walking the chunk list.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracts the raw PCM payload from a WAV stream.
///
/// Validates the `RIFF`/`WAVE` tags, then scans chunks sequentially: the
/// first `data` chunk's bytes are returned exactly; every other chunk is
/// skipped by seeking past its payload.
pub fn extract_pcm<R: Read + Seek>(reader: &mut R) -> Result<Vec<u8>, WavError> {
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag).map_err(|_| WavError::InvalidRiffTag)?;
    if &tag != b"RIFF" {
        return Err(WavError::InvalidRiffTag);
    }

    // Overall RIFF size, unused for the walk.
    reader.read_u32::<LittleEndian>()?;

    reader.read_exact(&mut tag).map_err(|_| WavError::InvalidWaveTag)?;
    if &tag != b"WAVE" {
        return Err(WavError::InvalidWaveTag);
    }

    loop {
        let mut chunk_id = [0u8; 4];
        match reader.read_exact(&mut chunk_id) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(WavError::MissingDataChunk);
            }
            Err(e) => return Err(WavError::Io(e)),
        }

        let chunk_size = reader.read_u32::<LittleEndian>()?;

        if &chunk_id == b"data" {
            let mut payload = vec![0u8; chunk_size as usize];
            reader.read_exact(&mut payload)?;
            return Ok(payload);
        }

        reader.seek(SeekFrom::Current(chunk_size as i64))?;
    }
}

/// Extracts the raw PCM payload from a WAV file on disk.
pub fn extract_pcm_file(path: &Path) -> Result<Vec<u8>, WavError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    extract_pcm(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn wav_with_chunks(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");
        for (id, payload) in chunks {
            body.extend_from_slice(*id);
            body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            body.extend_from_slice(payload);
        }
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn test_extracts_data_payload() {
        let pcm: Vec<u8> = (0..64).collect();
        let wav = wav_with_chunks(&[(b"fmt ", &[0u8; 16]), (b"data", &pcm)]);

        let extracted = extract_pcm(&mut Cursor::new(wav)).unwrap();
        assert_eq!(extracted, pcm);
    }

    #[test]
    fn test_skips_extra_chunks_before_data() {
        let pcm = [0xAB_u8; 32];
        let wav = wav_with_chunks(&[
            (b"fmt ", &[0u8; 16]),
            (b"LIST", b"some metadata here"),
            (b"fact", &[1, 0, 0, 0]),
            (b"data", &pcm),
        ]);

        let extracted = extract_pcm(&mut Cursor::new(wav)).unwrap();
        assert_eq!(extracted, pcm.to_vec());
    }

    #[test]
    fn test_rejects_non_riff() {
        let err = extract_pcm(&mut Cursor::new(b"FORM1234AIFF".to_vec())).unwrap_err();
        assert!(matches!(err, WavError::InvalidRiffTag));
    }

    #[test]
    fn test_rejects_non_wave() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(b"AVI ");
        let err = extract_pcm(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, WavError::InvalidWaveTag));
    }

    #[test]
    fn test_missing_data_chunk() {
        let wav = wav_with_chunks(&[(b"fmt ", &[0u8; 16])]);
        let err = extract_pcm(&mut Cursor::new(wav)).unwrap_err();
        assert!(matches!(err, WavError::MissingDataChunk));
    }

    #[test]
    fn test_truncated_data_chunk() {
        let mut wav = wav_with_chunks(&[(b"data", &[1, 2, 3, 4])]);
        wav.truncate(wav.len() - 2);
        let err = extract_pcm(&mut Cursor::new(wav)).unwrap_err();
        assert!(matches!(err, WavError::Io(_)));
    }
}
