use std::fs::File;
use std::io::{Cursor, Read};

use escframe_codec::{FrameError, FrameReader, IntegrityCheck};
use tracing::{info, warn};

use crate::cmd::{encode::parse_hex, DecodeArgs, DECODE_CAP};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let stream = open_input(&args)?;
    let integrity = if args.no_crc {
        IntegrityCheck::Without
    } else {
        IntegrityCheck::With
    };
    let integrity_label = if args.no_crc { "none" } else { "crc32" };

    let mut reader = FrameReader::<_, DECODE_CAP>::new(stream, integrity);
    let mut frames = 0usize;
    let mut failures = 0usize;

    loop {
        if let Some(count) = args.count {
            if frames >= count {
                break;
            }
        }

        match reader.read_frame() {
            Ok(payload) => {
                print_frame(frames, &payload, integrity_label, format);
                frames += 1;
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(err @ FrameError::Decode(_)) => {
                failures += 1;
                if args.strict {
                    return Err(frame_error("decode failed", err));
                }
                warn!(%err, "skipping corrupt frame");
            }
            Err(err) => return Err(frame_error("decode failed", err)),
        }
    }

    info!(frames, failures, "decode complete");
    Ok(SUCCESS)
}

fn open_input(args: &DecodeArgs) -> CliResult<Box<dyn Read>> {
    if args.hex {
        let mut text = String::new();
        match &args.input {
            Some(path) => {
                File::open(path)
                    .and_then(|mut f| f.read_to_string(&mut text))
                    .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
            }
            None => {
                std::io::stdin()
                    .lock()
                    .read_to_string(&mut text)
                    .map_err(|err| io_error("failed reading stdin", err))?;
            }
        }
        return Ok(Box::new(Cursor::new(parse_hex(&text)?)));
    }

    match &args.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(std::io::stdin())),
    }
}
