//! Frame a few payloads over an in-process socket pair.
//!
//! Run with: cargo run -p escframe-codec --example loopback

use escframe_codec::{
    decoded_capacity, encoded_capacity, FrameReader, FrameWriter, IntegrityCheck,
};

const MAX_PAYLOAD: usize = 1024;

fn main() -> escframe_codec::Result<()> {
    let (left, right) = std::os::unix::net::UnixStream::pair()?;

    let mut writer =
        FrameWriter::<_, { encoded_capacity(MAX_PAYLOAD) }>::new(left, IntegrityCheck::With);
    let mut reader =
        FrameReader::<_, { decoded_capacity(MAX_PAYLOAD) }>::new(right, IntegrityCheck::With);

    for payload in [&b"hello"[..], b"\x02\x03\x1b", b""] {
        writer.send(payload)?;
        let frame = reader.read_frame()?;
        println!("received {} bytes: {:02x?}", frame.len(), frame.as_ref());
    }

    Ok(())
}
