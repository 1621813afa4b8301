//! Opens a save archive, locates the level container and decodes its
//! header and startup settings (§4.12).

use std::io::Read;

use camino::Utf8Path;
use flate2::read::ZlibDecoder;
use fmm_codec::Reader as ByteReader;

use crate::{
    error::{SaveError, SaveResult},
    header::{read_header, SaveHeader},
};

/// Candidate level-container member names, in probe order. Both are seen in
/// the wild; the first is preferred (§9).
const LEVEL_MEMBER_CANDIDATES: [&str; 2] = ["level.dat0", "level-init.dat"];

const ZLIB_MAGIC: u8 = 0x78;

pub struct SaveFileReader;

impl SaveFileReader {
    /// Reads `path`'s header. Locates the level member by trying each
    /// candidate name against every top-level directory in the archive
    /// (saves are a single top-level directory, whose name varies).
    pub fn read(path: &Utf8Path) -> SaveResult<SaveHeader> {
        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        let member_name = find_level_member(&mut archive)?;
        let raw = {
            let mut member = archive.by_name(&member_name)?;
            let mut buf = Vec::with_capacity(member.size() as usize);
            member.read_to_end(&mut buf)?;
            buf
        };

        let decompressed = decompress(&raw)?;
        let mut reader = ByteReader::new(&decompressed);
        Ok(read_header(&mut reader)?)
    }
}

fn find_level_member(archive: &mut zip::ZipArchive<std::fs::File>) -> SaveResult<String> {
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    for candidate in LEVEL_MEMBER_CANDIDATES {
        if let Some(found) = names.iter().find(|n| n.ends_with(candidate)) {
            return Ok(found.clone());
        }
    }

    Err(SaveError::MissingLevelMember)
}

fn decompress(raw: &[u8]) -> SaveResult<Vec<u8>> {
    if raw.first() == Some(&ZLIB_MAGIC) {
        let mut decoder = ZlibDecoder::new(raw);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(raw.to_vec())
    }
}
