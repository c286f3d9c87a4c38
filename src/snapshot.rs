//! Gzipped bincode snapshot of the persisted model.
//!
//! Resolver maps and the resolved view are `#[serde(skip)]` on the model, so
//! they never reach the bytes; loading rebuilds the resolvers and leaves the
//! model unresolved.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

use crate::error::{OewnError, Result};
use crate::wordnet::WordnetModel;

/// Leading bytes of every snapshot, before compression.
const MAGIC: &[u8; 8] = b"OEWNSNP1";

pub fn write_snapshot<W: Write>(wn: &WordnetModel, out: W) -> Result<W> {
    let mut gz = GzEncoder::new(out, Compression::default());
    gz.write_all(MAGIC)?;
    bincode::serialize_into(&mut gz, wn)?;
    Ok(gz.finish()?)
}

pub fn read_snapshot<R: Read>(source: R) -> Result<WordnetModel> {
    let mut gz = GzDecoder::new(source);
    let mut magic = [0u8; 8];
    gz.read_exact(&mut magic)
        .map_err(|e| OewnError::load(format!("Not a snapshot: {}", e)))?;
    if &magic != MAGIC {
        return Err(OewnError::load("Not a snapshot: bad header"));
    }
    let mut wn: WordnetModel = bincode::deserialize_from(&mut gz)?;
    wn.rebuild_resolvers();
    Ok(wn)
}

pub fn save(wn: &WordnetModel, path: &Path) -> Result<()> {
    let start = Instant::now();
    info!("Writing snapshot to {:?}", path);
    let out = write_snapshot(wn, BufWriter::new(File::create(path)?))?;
    out.into_inner()
        .map_err(|e| OewnError::Write(e.to_string()))?
        .sync_all()?;
    info!("Wrote {} to snapshot. Took {:.2?}", wn, start.elapsed());
    Ok(())
}

pub fn load(path: &Path) -> Result<WordnetModel> {
    let start = Instant::now();
    info!("Reading snapshot {:?}", path);
    let wn = read_snapshot(BufReader::new(File::open(path)?))?;
    info!("Loaded {} from snapshot. Took {:.2?}", wn, start.elapsed());
    Ok(wn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::force_model;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_snapshot_round_trip_rebuilds_resolvers() {
        let mut wn = force_model();
        wn.extend().unwrap();
        wn.resolve().unwrap();

        let bytes = write_snapshot(&wn, Vec::new()).unwrap();
        let back = read_snapshot(bytes.as_slice()).unwrap();

        assert!(!back.is_resolved());
        assert_eq!(back.entries, wn.entries);
        assert_eq!(back.synsets, wn.synsets);
        assert_eq!(back.verbframes, wn.verbframes);
        assert!(back.sense("force%1:04:00::").is_some());
        assert!(back.member("violence", "00000300-n").is_some());
    }

    #[test]
    fn test_resolved_view_does_not_change_bytes() {
        let mut wn = force_model();
        let plain = write_snapshot(&wn, Vec::new()).unwrap();
        wn.resolve().unwrap();
        let resolved = write_snapshot(&wn, Vec::new()).unwrap();
        assert_eq!(plain, resolved);
    }

    #[test]
    fn test_rejects_foreign_bytes() {
        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(b"<?xml version=\"1.0\"?>").unwrap();
        let bytes = gz.finish().unwrap();
        assert!(matches!(read_snapshot(bytes.as_slice()), Err(OewnError::Load(_))));
        assert!(read_snapshot(&b"plain"[..]).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wn.bin");
        save(&force_model(), &path).unwrap();
        assert_eq!(load(&path).unwrap().synsets.len(), 8);
    }
}
