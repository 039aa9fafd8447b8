use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::bytes::Regex;

const ID3V2_MAGIC: &[u8; 3] = b"ID3";
const ID3V2_HEADER_LEN: usize = 10;
const ID3V1_MAGIC: &[u8; 3] = b"TAG";
const ID3V1_LEN: u64 = 128;
const APE_MAGIC: &[u8; 8] = b"APETAGEX";
const APE_FOOTER_LEN: u64 = 32;

// Frame text is either Latin-1/UTF-8 or UTF-16; the second pattern allows a
// NUL between characters so both UTF-16 byte orders match.
static REPLAYGAIN_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i-u)REPLAYGAIN_TRACK_GAIN").unwrap());

static REPLAYGAIN_MARKER_UTF16: Lazy<Regex> = Lazy::new(|| {
    let pattern: Vec<String> = "REPLAYGAIN_TRACK_GAIN"
        .chars()
        .map(|c| c.to_string())
        .collect();
    Regex::new(&format!(r"(?i-u){}", pattern.join(r"\x00"))).unwrap()
});

/// Whether an MP3 carries a ReplayGain track gain, either in its leading
/// ID3v2 tag or in a trailing APEv2 tag (where MP3Gain writes it).
pub fn has_replaygain_tag(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    Ok(leading_id3v2(&mut file)?.is_some_and(|tag| has_marker(&tag))
        || trailing_apev2(&mut file)?.is_some_and(|tag| has_marker(&tag)))
}

fn has_marker(tag: &[u8]) -> bool {
    REPLAYGAIN_MARKER.is_match(tag) || REPLAYGAIN_MARKER_UTF16.is_match(tag)
}

/// Frames of the ID3v2 tag at the start of the file.
fn leading_id3v2(file: &mut File) -> io::Result<Option<Vec<u8>>> {
    file.seek(SeekFrom::Start(0))?;

    let mut header = [0u8; ID3V2_HEADER_LEN];
    match file.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    if &header[..3] != ID3V2_MAGIC {
        return Ok(None);
    }

    let tag_len = syncsafe(&header[6..10]);
    let mut tag = Vec::with_capacity(tag_len.min(1 << 20));
    file.take(tag_len as u64).read_to_end(&mut tag)?;
    Ok(Some(tag))
}

/// Items of the APEv2 tag whose footer ends the file, or sits right before
/// an ID3v1 block.
fn trailing_apev2(file: &mut File) -> io::Result<Option<Vec<u8>>> {
    let mut end = file.metadata()?.len();

    if end >= ID3V1_LEN {
        let mut magic = [0u8; 3];
        file.seek(SeekFrom::Start(end - ID3V1_LEN))?;
        file.read_exact(&mut magic)?;
        if &magic == ID3V1_MAGIC {
            end -= ID3V1_LEN;
        }
    }

    if end < APE_FOOTER_LEN {
        return Ok(None);
    }

    let mut footer = [0u8; APE_FOOTER_LEN as usize];
    file.seek(SeekFrom::Start(end - APE_FOOTER_LEN))?;
    file.read_exact(&mut footer)?;
    if &footer[..8] != APE_MAGIC {
        return Ok(None);
    }

    // Size covers the items and the footer, never the optional header
    let size = u64::from(u32::from_le_bytes([footer[12], footer[13], footer[14], footer[15]]));
    if size < APE_FOOTER_LEN || size > end {
        return Ok(None);
    }

    let items_len = size - APE_FOOTER_LEN;
    let mut items = Vec::with_capacity(items_len.min(1 << 20) as usize);
    file.seek(SeekFrom::Start(end - size))?;
    file.take(items_len).read_to_end(&mut items)?;
    Ok(Some(items))
}

fn syncsafe(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | usize::from(b & 0x7f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn id3_file(body: &[u8]) -> Vec<u8> {
        let len = body.len();
        let mut data = b"ID3\x04\x00\x00".to_vec();
        data.extend_from_slice(&[
            ((len >> 21) & 0x7f) as u8,
            ((len >> 14) & 0x7f) as u8,
            ((len >> 7) & 0x7f) as u8,
            (len & 0x7f) as u8,
        ]);
        data.extend_from_slice(body);
        data.extend_from_slice(b"\xff\xfbaudio frames");
        data
    }

    /// APEv2 items followed by a footer, no header.
    fn ape_tag(items: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (key, value) in items {
            body.extend_from_slice(&(value.len() as u32).to_le_bytes());
            body.extend_from_slice(&0u32.to_le_bytes());
            body.extend_from_slice(key.as_bytes());
            body.push(0);
            body.extend_from_slice(value.as_bytes());
        }
        let size = (body.len() + 32) as u32;
        body.extend_from_slice(b"APETAGEX");
        body.extend_from_slice(&2000u32.to_le_bytes());
        body.extend_from_slice(&size.to_le_bytes());
        body.extend_from_slice(&(items.len() as u32).to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&[0u8; 8]);
        body
    }

    #[test]
    fn test_tagged_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, id3_file(b"TXXX\x00\x00\x00\x20\x00\x00\x00replaygain_track_gain\x00-6.5 dB")).unwrap();

        assert!(has_replaygain_tag(&path).unwrap());
    }

    #[test]
    fn test_utf16_tagged_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        let text: Vec<u8> = "REPLAYGAIN_TRACK_GAIN"
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let mut body = b"TXXX\x00\x00\x00\x40\x00\x00\x01\xff\xfe".to_vec();
        body.extend_from_slice(&text);
        fs::write(&path, id3_file(&body)).unwrap();

        assert!(has_replaygain_tag(&path).unwrap());
    }

    #[test]
    fn test_untagged_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, id3_file(b"TIT2\x00\x00\x00\x05\x00\x00\x00Title")).unwrap();

        assert!(!has_replaygain_tag(&path).unwrap());
    }

    #[test]
    fn test_marker_outside_any_tag_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        let mut data = id3_file(b"TIT2");
        data.extend_from_slice(b"REPLAYGAIN_TRACK_GAIN");
        fs::write(&path, data).unwrap();

        assert!(!has_replaygain_tag(&path).unwrap());
    }

    #[test]
    fn test_mp3gain_ape_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        let mut data = id3_file(b"TIT2\x00\x00\x00\x05\x00\x00\x00Title");
        data.extend_from_slice(&ape_tag(&[("REPLAYGAIN_TRACK_GAIN", "-3.20 dB")]));
        fs::write(&path, data).unwrap();

        assert!(has_replaygain_tag(&path).unwrap());
    }

    #[test]
    fn test_ape_tag_before_id3v1() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        let mut data = b"\xff\xfbaudio frames".to_vec();
        data.extend_from_slice(&ape_tag(&[
            ("MP3GAIN_MINMAX", "120,210"),
            ("REPLAYGAIN_TRACK_GAIN", "+1.05 dB"),
        ]));
        let mut id3v1 = b"TAG".to_vec();
        id3v1.resize(128, 0);
        data.extend_from_slice(&id3v1);
        fs::write(&path, data).unwrap();

        assert!(has_replaygain_tag(&path).unwrap());
    }

    #[test]
    fn test_ape_tag_without_gain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        let mut data = b"\xff\xfbREPLAYGAIN_TRACK_GAIN in audio".to_vec();
        data.extend_from_slice(&ape_tag(&[("MP3GAIN_MINMAX", "120,210")]));
        fs::write(&path, data).unwrap();

        assert!(!has_replaygain_tag(&path).unwrap());
    }

    #[test]
    fn test_file_without_id3_header() {
        let dir = tempdir().unwrap();
        let short = dir.path().join("short.mp3");
        let raw = dir.path().join("raw.mp3");
        fs::write(&short, b"ID").unwrap();
        fs::write(&raw, b"\xff\xfb REPLAYGAIN_TRACK_GAIN").unwrap();

        assert!(!has_replaygain_tag(&short).unwrap());
        assert!(!has_replaygain_tag(&raw).unwrap());
    }

    #[test]
    fn test_syncsafe() {
        assert_eq!(syncsafe(&[0, 0, 2, 1]), 257);
        assert_eq!(syncsafe(&[0x7f, 0x7f, 0x7f, 0x7f]), (1 << 28) - 1);
    }
}
