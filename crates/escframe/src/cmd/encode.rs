use std::fs;
use std::io::Read;

use escframe_codec::{Encoder, IntegrityCheck};

use crate::cmd::{EncodeArgs, ENCODE_CAP, MAX_PAYLOAD};
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::print_raw;

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    if payload.len() > MAX_PAYLOAD {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "payload too large ({} bytes, max {MAX_PAYLOAD})",
                payload.len()
            ),
        ));
    }

    let integrity = if args.no_crc {
        IntegrityCheck::Without
    } else {
        IntegrityCheck::With
    };

    let mut encoder = Encoder::<ENCODE_CAP>::new(integrity);
    let written = encoder.put(&payload);
    if written < payload.len() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("payload truncated at byte {written}"),
        ));
    }
    let frame = encoder
        .finalize()
        .map_err(|err| CliError::new(DATA_INVALID, format!("finalize failed: {err}")))?;

    tracing::debug!(
        payload = payload.len(),
        frame = frame.len(),
        crc = !args.no_crc,
        "frame encoded"
    );

    if let Some(path) = &args.out {
        let bytes: Vec<u8> = if args.hex_out {
            hex::encode(frame).into_bytes()
        } else {
            frame.to_vec()
        };
        fs::write(path, bytes)
            .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?;
    } else if args.hex_out {
        println!("{}", hex::encode(frame));
    } else {
        print_raw(frame);
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(text) = &args.hex {
        return parse_hex(text);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }

    let mut payload = Vec::new();
    std::io::stdin()
        .lock()
        .read_to_end(&mut payload)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(payload)
}

pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.split_whitespace().collect();
    hex::decode(&compact).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}
