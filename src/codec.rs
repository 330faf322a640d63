use bytes::{Buf, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

/// Re-encodes a byte stream in a legacy charset (e.g. windows-1256) as UTF-8.
pub struct Utf8Transcoder {
    decoder: encoding_rs::Decoder,
    // encoding_rs panics if a decoder is used after its final call
    finished: bool,
}

impl Utf8Transcoder {
    pub fn new(encoding: &'static encoding_rs::Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder_with_bom_removal(),
            finished: false,
        }
    }

    fn transcode(&mut self, src: &mut BytesMut, last: bool) -> Option<BytesMut> {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or_else(|| src.len() * 3 + 4);
        let mut out = vec![0; capacity];

        let (_result, read, written, _had_replacements) =
            self.decoder.decode_to_utf8(src, &mut out, last);
        src.advance(read);

        (written > 0).then(|| BytesMut::from(&out[..written]))
    }
}

impl Decoder for Utf8Transcoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        // An incomplete trailing sequence stays buffered in the decoder.
        Ok(self.transcode(src, false))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.finished {
            buf.clear();
            return Ok(None);
        }
        // Flushes a dangling partial sequence as U+FFFD, exactly once.
        self.finished = true;
        let out = self.transcode(buf, true);
        buf.clear();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_1256_arabic_becomes_utf8() {
        let (encoded, _, _) = encoding_rs::WINDOWS_1256.encode("الجنسية,x\n");
        let mut src = BytesMut::from(&encoded[..]);
        let mut codec = Utf8Transcoder::new(encoding_rs::WINDOWS_1256);

        let mut out = Vec::new();
        while let Some(chunk) = codec.decode(&mut src).unwrap() {
            out.extend_from_slice(&chunk);
        }
        if let Some(chunk) = codec.decode_eof(&mut src).unwrap() {
            out.extend_from_slice(&chunk);
        }
        assert_eq!(String::from_utf8(out).unwrap(), "الجنسية,x\n");
    }

    #[tokio::test]
    async fn truncated_trailing_lead_byte_becomes_replacement() {
        use tokio::io::AsyncReadExt;
        use tokio_util::codec::FramedRead;
        use tokio_util::io::StreamReader;

        let src: &[u8] = b"a,b\n1,2\n\x82";
        let framed = FramedRead::new(src, Utf8Transcoder::new(encoding_rs::SHIFT_JIS));
        let mut reader = StreamReader::new(framed);

        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "a,b\n1,2\n\u{fffd}");
    }

    #[test]
    fn decode_eof_after_finish_yields_nothing() {
        let mut codec = Utf8Transcoder::new(encoding_rs::SHIFT_JIS);
        let mut src = BytesMut::from(&b"\x82"[..]);
        assert!(codec.decode_eof(&mut src).unwrap().is_some());
        assert!(codec.decode_eof(&mut src).unwrap().is_none());
        assert!(codec.decode_eof(&mut BytesMut::new()).unwrap().is_none());
    }
}
