use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use escframe_codec::{CRC_LENGTH, ESC, ETX, STX};
use serde::Serialize;

use crate::cmd::{InfoArgs, DECODE_CAP, ENCODE_CAP, MAX_PAYLOAD};
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct WireInfo {
    stx: String,
    etx: String,
    esc: String,
    crc_length: usize,
    max_payload: usize,
    encode_capacity: usize,
    decode_capacity: usize,
}

pub fn run(_args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let info = WireInfo {
        stx: format!("{STX:#04x}"),
        etx: format!("{ETX:#04x}"),
        esc: format!("{ESC:#04x}"),
        crc_length: CRC_LENGTH,
        max_payload: MAX_PAYLOAD,
        encode_capacity: ENCODE_CAP,
        decode_capacity: DECODE_CAP,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
            );
        }
        _ => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["start sentinel (STX)".to_string(), info.stx])
                .add_row(vec!["end sentinel (ETX)".to_string(), info.etx])
                .add_row(vec!["escape marker (ESC)".to_string(), info.esc])
                .add_row(vec!["CRC length".to_string(), info.crc_length.to_string()])
                .add_row(vec!["max payload".to_string(), info.max_payload.to_string()])
                .add_row(vec![
                    "encode buffer".to_string(),
                    info.encode_capacity.to_string(),
                ])
                .add_row(vec![
                    "decode buffer".to_string(),
                    info.decode_capacity.to_string(),
                ]);
            println!("{table}");
        }
    }

    Ok(SUCCESS)
}
