//! Merge command implementation.

use chunkfile_core::{
    ChunkCreateInfo, ChunkFileReader, ChunkFileWriter, ChunkId, Compression, CoreError,
    WriterConfig,
};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors from merging containers.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Both inputs use at least one identifier.
    #[error("Cannot merge files containing the same chunk identifiers: {}", .ids.join(", "))]
    OverlappingIdentifiers {
        /// The shared identifiers, sorted.
        ids: Vec<String>,
    },

    /// Reading an input or writing the output failed.
    #[error(transparent)]
    Container(#[from] CoreError),
}

fn identifiers(reader: &ChunkFileReader<'_>) -> BTreeSet<ChunkId> {
    reader.iter().map(|d| d.id).collect()
}

/// Copies every chunk of `reader` into `writer` in write order.
fn copy_chunks(
    reader: &ChunkFileReader<'_>,
    writer: &mut ChunkFileWriter<'_>,
    compression: Compression,
) -> Result<usize, CoreError> {
    let mut cursor = reader.iter();
    let mut copied = 0;
    while !cursor.is_at_end() {
        let descriptor = cursor.descriptor()?;
        let header = cursor.read_header()?;
        let data = cursor.read_data()?;

        let info = ChunkCreateInfo {
            id: descriptor.id,
            header: &header,
            version: descriptor.version,
            compression: compression.tag(),
        };
        writer.write_chunk_with(&info, &data)?;

        copied += 1;
        cursor.advance();
    }
    Ok(copied)
}

/// Merges `input1` and `input2` into a new container at `output`.
///
/// Chunks of `input1` come first. Identifiers, indices, versions, headers
/// and data are preserved; data is stored with zstd if `compress` is set.
pub fn merge(
    input1: &Path,
    input2: &Path,
    output: &Path,
    compress: bool,
) -> Result<usize, MergeError> {
    let first = ChunkFileReader::open_path(input1)?;
    let second = ChunkFileReader::open_path(input2)?;

    let shared: Vec<String> = identifiers(&first)
        .intersection(&identifiers(&second))
        .map(ChunkId::to_string_lossy)
        .collect();
    if !shared.is_empty() {
        return Err(MergeError::OverlappingIdentifiers { ids: shared });
    }

    let compression = if compress {
        Compression::Zstd
    } else {
        Compression::None
    };
    let mut writer = ChunkFileWriter::create_path(output, WriterConfig::new())?;
    let copied = copy_chunks(&first, &mut writer, compression)?
        + copy_chunks(&second, &mut writer, compression)?;
    writer.finish()?;

    Ok(copied)
}

/// Runs the merge command.
pub fn run(
    input1: &Path,
    input2: &Path,
    output: &Path,
    compress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Merging {:?} and {:?} into {:?}", input1, input2, output);

    let copied = merge(input1, input2, output, compress)?;

    println!("✓ Merged {copied} chunks into {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, chunks: &[(&str, u32, &[u8])]) {
        let mut writer = ChunkFileWriter::create_path(path, WriterConfig::new()).unwrap();
        for (id, version, data) in chunks {
            let info = ChunkCreateInfo::new(id).unwrap().header(b"h").version(*version);
            writer.write_chunk_with(&info, data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn merge_disjoint_inputs() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.chunks");
        let b = dir.path().join("b.chunks");
        let out = dir.path().join("out.chunks");
        write(&a, &[("mesh", 1, b"m0".as_slice()), ("mesh", 2, b"m1".as_slice())]);
        write(&b, &[("tex", 7, [5u8; 200].as_slice())]);

        assert_eq!(merge(&a, &b, &out, true).unwrap(), 3);

        let reader = ChunkFileReader::open_path(&out).unwrap();
        let order: Vec<(String, u32)> = reader
            .iter()
            .map(|d| (d.id.to_string_lossy(), d.index))
            .collect();
        assert_eq!(
            order,
            vec![
                ("mesh".to_string(), 0),
                ("mesh".to_string(), 1),
                ("tex".to_string(), 0),
            ]
        );
        assert_eq!(reader.chunk_version_at("mesh", 1).unwrap(), 2);
        assert_eq!(reader.read_chunk_header("tex", 0).unwrap(), b"h");
        assert_eq!(reader.read_chunk_data("tex", 0).unwrap(), vec![5u8; 200]);
        assert_eq!(
            reader.descriptor("tex", 0).unwrap().compression,
            Compression::Zstd.tag()
        );
    }

    #[test]
    fn merge_refuses_shared_identifiers() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.chunks");
        let b = dir.path().join("b.chunks");
        let out = dir.path().join("out.chunks");
        write(&a, &[("mesh", 0, b"x".as_slice()), ("common", 0, b"y".as_slice())]);
        write(&b, &[("common", 0, b"z".as_slice())]);

        let err = merge(&a, &b, &out, false).unwrap_err();
        match err {
            MergeError::OverlappingIdentifiers { ids } => assert_eq!(ids, vec!["common"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!out.exists());
    }

    #[test]
    fn merge_compares_raw_identifier_bytes() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.chunks");
        let b = dir.path().join("b.chunks");
        let out = dir.path().join("out.chunks");

        // Both ids render as "\u{FFFD}" but are different byte strings
        for (path, id) in [(&a, [0xFFu8]), (&b, [0xFEu8])] {
            let mut writer = ChunkFileWriter::create_path(path, WriterConfig::new()).unwrap();
            writer.write_chunk(id, b"", b"raw").unwrap();
            writer.finish().unwrap();
        }

        assert_eq!(merge(&a, &b, &out, false).unwrap(), 2);
        let reader = ChunkFileReader::open_path(&out).unwrap();
        assert!(reader.contains_chunk([0xFFu8]).unwrap());
        assert!(reader.contains_chunk([0xFEu8]).unwrap());
    }
}
