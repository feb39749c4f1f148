//! Info command implementation.

use chunkfile_core::{ChunkFileReader, CoreResult};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::Path;

/// Summary of a whole container.
#[derive(Debug, Serialize)]
pub struct InfoResult {
    /// Chunks in write order.
    pub chunks: Vec<ChunkSummary>,
}

/// One chunk of the summary.
#[derive(Debug, Serialize)]
pub struct ChunkSummary {
    /// Chunk identifier.
    pub id: String,
    /// Disambiguation index.
    pub index: u32,
    /// Sizes and version.
    pub info: ChunkInfo,
    /// Whether other chunks share this identifier.
    #[serde(skip)]
    pub shared_id: bool,
}

/// Sizes and version of a chunk.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    /// Uncompressed data size in bytes.
    pub data_size: u64,
    /// Header size in bytes.
    pub header_size: u64,
    /// Writer-supplied version.
    pub version: u32,
}

/// Collects the summary of an open container.
pub fn summarize(reader: &ChunkFileReader<'_>) -> CoreResult<InfoResult> {
    let mut chunks = Vec::with_capacity(reader.len());
    for descriptor in reader.iter() {
        chunks.push(ChunkSummary {
            id: descriptor.id.to_string_lossy(),
            index: descriptor.index,
            info: ChunkInfo {
                data_size: descriptor.uncompressed_size,
                header_size: descriptor.header_size,
                version: descriptor.version,
            },
            shared_id: reader.chunk_count(descriptor.id)? > 1,
        });
    }
    Ok(InfoResult { chunks })
}

/// Renders the summary as text.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn render_text(result: &InfoResult) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for chunk in &result.chunks {
        if chunk.shared_id {
            writeln!(out, "ID: {}[{}]", chunk.id, chunk.index)?;
        } else {
            writeln!(out, "ID: {}", chunk.id)?;
        }
        writeln!(out, "  Data size:   {}", chunk.info.data_size)?;
        writeln!(out, "  Header size: {}", chunk.info.header_size)?;
        writeln!(out, "  Version    : {}", chunk.info.version)?;
    }
    Ok(out)
}

/// Runs the info command.
pub fn run(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Inspecting {:?}", input);

    let reader = ChunkFileReader::open_path(input)?;
    let result = summarize(&reader)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_text(&result)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkfile_core::{ChunkCreateInfo, ChunkFileWriter, MemoryStream};

    fn sample() -> MemoryStream {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
        writer.write_chunk("chunk0", b"", b"some data").unwrap();
        writer.write_chunk("chunk0", b"hh", b"").unwrap();
        writer
            .write_chunk_with(&ChunkCreateInfo::new("chunk1").unwrap().version(3), b"x")
            .unwrap();
        writer.close().unwrap();
        drop(writer);
        stream
    }

    #[test]
    fn text_output_marks_shared_identifiers() {
        let mut stream = sample();
        let reader = ChunkFileReader::open(&mut stream).unwrap();
        let text = render_text(&summarize(&reader).unwrap()).unwrap();

        assert!(text.contains("ID: chunk0[0]\n  Data size:   9\n  Header size: 0\n"));
        assert!(text.contains("ID: chunk0[1]\n  Data size:   0\n  Header size: 2\n"));
        assert!(text.contains("ID: chunk1\n  Data size:   1\n  Header size: 0\n  Version    : 3\n"));
    }

    #[test]
    fn json_output_layout() {
        let mut stream = sample();
        let reader = ChunkFileReader::open(&mut stream).unwrap();
        let value = serde_json::to_value(summarize(&reader).unwrap()).unwrap();

        let chunks = value["chunks"].as_array().unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1]["id"], "chunk0");
        assert_eq!(chunks[1]["index"], 1);
        assert_eq!(chunks[2]["info"]["dataSize"], 1);
        assert_eq!(chunks[2]["info"]["headerSize"], 0);
        assert_eq!(chunks[2]["info"]["version"], 3);
        assert!(chunks[0].get("shared_id").is_none());
    }

    #[test]
    fn run_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("missing.chunks"), false).is_err());
    }
}
