use crate::IngestResult;
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::codec::Utf8Transcoder;
use crate::decode::SourceFormat;

#[derive(Debug, Clone)]
pub struct SourceMeta {
    /// e.g. "gzip", "zstd", or empty
    pub content_encoding: String,
    /// file name, used for compression and format detection
    pub name_hint: String,
    /// Character encoding of text sources (defaults to UTF-8)
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for SourceMeta {
    fn default() -> Self {
        Self {
            content_encoding: String::new(),
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

impl SourceMeta {
    fn is_gzip(&self) -> bool {
        self.content_encoding
            .split(',')
            .any(|s| s.trim().eq_ignore_ascii_case("gzip"))
            || self.name_hint.ends_with(".gz")
    }

    fn is_zstd(&self) -> bool {
        self.content_encoding
            .split(',')
            .any(|s| s.trim().eq_ignore_ascii_case("zstd"))
            || self.name_hint.ends_with(".zst")
    }

    /// Lower-cased extension beneath any compression suffix
    /// (`DB.csv.gz` gives `csv`).
    pub fn extension(&self) -> String {
        let name = self.name_hint.to_ascii_lowercase();
        let name = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".zst"))
            .unwrap_or(&name);
        Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// From a generic AsyncRead, wrap with optional decompression and UTF-8 transcoding.
///
/// Spreadsheet sources are binary and are never transcoded.
pub fn build_source_reader<R>(raw: R, meta: &SourceMeta) -> Box<dyn AsyncRead + Unpin + Send>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buf = BufReader::with_capacity(1 << 20, raw);
    let decompressed: Box<dyn AsyncRead + Unpin + Send> = if meta.is_gzip() {
        Box::new(GzipDecoder::new(buf))
    } else if meta.is_zstd() {
        Box::new(ZstdDecoder::new(buf))
    } else {
        Box::new(buf)
    };

    let binary = SourceFormat::from_extension(&meta.extension()).is_some_and(SourceFormat::is_spreadsheet);
    if binary || meta.charset == encoding_rs::UTF_8 {
        decompressed
    } else {
        let framed = FramedRead::new(decompressed, Utf8Transcoder::new(meta.charset));
        Box::new(StreamReader::new(framed))
    }
}

/// Build a reader from a local file path (meta from the file name).
pub async fn reader_from_path(
    path: &Path,
    charset: &'static encoding_rs::Encoding,
) -> IngestResult<(Box<dyn AsyncRead + Unpin + Send>, SourceMeta)> {
    let file = File::open(path).await?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let content_encoding = if name.ends_with(".gz") {
        "gzip"
    } else if name.ends_with(".zst") {
        "zstd"
    } else {
        ""
    };
    let meta = SourceMeta {
        content_encoding: content_encoding.into(),
        name_hint: name,
        charset,
    };

    Ok((build_source_reader(file, &meta), meta))
}

/// Reads a whole source file, returning its content and extension token.
pub async fn read_source(
    path: &Path,
    charset: &'static encoding_rs::Encoding,
) -> IngestResult<(Vec<u8>, String)> {
    let (mut reader, meta) = reader_from_path(path, charset).await?;
    let mut content = Vec::new();
    reader.read_to_end(&mut content).await?;
    debug!(path = %path.display(), bytes = content.len(), "read source file");
    Ok((content, meta.extension()))
}
