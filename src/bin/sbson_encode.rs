//! `sbson-encode <input.json> <output.sbson>` — reads a JSON document,
//! encodes it with default options, and writes the resulting bytes.

use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: sbson-encode <input.json> <output.sbson>");
        process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];

    let input_text = match fs::read_to_string(input_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: failed to read {input_path}: {e}");
            process::exit(1);
        }
    };

    let json: serde_json::Value = match serde_json::from_str(&input_text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {input_path} is not valid JSON: {e}");
            process::exit(1);
        }
    };

    let value = match sbson::io::value_from_json(&json) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: cannot represent document as SBSON: {e}");
            process::exit(1);
        }
    };

    let bytes = match sbson::encode(&value, &sbson::EncodeOptions::default()) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: encode failed: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = fs::write(output_path, &bytes) {
        eprintln!("error: failed to write {output_path}: {e}");
        process::exit(1);
    }
}
