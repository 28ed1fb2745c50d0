#![forbid(unsafe_code)]

use ev_codec::{ByteOrder, Codec, CodecConfig, EValue};
use std::path::PathBuf;

const VALUE_FLAGS: [&str; 2] = ["--byte-order", "--config"];

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let env_byte_order = std::env::var("EV_BYTE_ORDER").ok();
    let output = execute(&args, env_byte_order.as_deref())?;
    println!("{output}");
    Ok(())
}

/// Flags may appear anywhere; the first positional is the command.
fn execute(args: &[String], env_byte_order: Option<&str>) -> Result<String, String> {
    let positionals = positional_args(args);
    let Some((command, rest)) = positionals.split_first() else {
        return Err(usage());
    };
    let codec = Codec::new(resolve_config(args, env_byte_order)?);

    match command.as_str() {
        "decode" => cmd_decode(&codec, rest),
        "none" | "int" | "double" | "bool" | "string" => cmd_encode(&codec, command, rest),
        _ => Err(usage()),
    }
}

fn cmd_encode(codec: &Codec, kind: &str, positionals: &[String]) -> Result<String, String> {
    let value = parse_value(kind, positionals)?;
    let encoded = codec.encode(&value).map_err(|err| err.to_string())?;
    Ok(encoded.to_hex())
}

fn cmd_decode(codec: &Codec, positionals: &[String]) -> Result<String, String> {
    if positionals.is_empty() {
        return Err("decode needs a hex buffer".to_owned());
    }
    let bytes = parse_hex(&positionals.concat())?;
    let value = codec.decode(&bytes).map_err(|err| err.to_string())?;
    Ok(describe(&value))
}

fn parse_value(kind: &str, positionals: &[String]) -> Result<EValue, String> {
    if kind == "none" {
        return match positionals {
            [] => Ok(EValue::none()),
            _ => Err("none takes no value".to_owned()),
        };
    }

    let [raw] = positionals else {
        return Err(format!("{kind} takes exactly one value"));
    };
    match kind {
        "int" => raw
            .parse::<i64>()
            .map(EValue::from_int)
            .map_err(|err| format!("invalid int `{raw}`: {err}")),
        "double" => raw
            .parse::<f64>()
            .map(EValue::from_double)
            .map_err(|err| format!("invalid double `{raw}`: {err}")),
        "bool" => raw
            .parse::<bool>()
            .map(EValue::from_bool)
            .map_err(|err| format!("invalid bool `{raw}`: {err}")),
        _ => Ok(EValue::from_string(raw.as_str())),
    }
}

fn describe(value: &EValue) -> String {
    match value {
        EValue::None => "none".to_owned(),
        EValue::Int(v) => format!("int {v}"),
        EValue::Double(v) => format!("double {v:?}"),
        EValue::Bool(v) => format!("bool {v}"),
        EValue::String(v) => format!("string {v:?}"),
        EValue::Tensor(t) => format!("tensor {:?} {:?}", t.dtype(), t.shape().dims),
    }
}

/// Accepts `04 00 00 00 01` as well as `0400000001`.
fn parse_hex(raw: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<char> = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in `{raw}`"));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair: String = pair.iter().collect();
            u8::from_str_radix(&pair, 16).map_err(|err| format!("invalid hex byte `{pair}`: {err}"))
        })
        .collect()
}

/// `--byte-order` wins over `--config`, which wins over `EV_BYTE_ORDER`.
fn resolve_config(args: &[String], env_byte_order: Option<&str>) -> Result<CodecConfig, String> {
    let mut config = match optional_string_flag(args, "--config")? {
        Some(path) => {
            let path = PathBuf::from(path);
            let raw = std::fs::read_to_string(&path)
                .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
            CodecConfig::from_json(&raw).map_err(|err| err.to_string())?
        }
        None => match env_byte_order {
            Some(raw) => CodecConfig::with_byte_order(
                parse_byte_order(raw).map_err(|err| format!("EV_BYTE_ORDER: {err}"))?,
            ),
            None => CodecConfig::default(),
        },
    };

    if let Some(raw) = optional_string_flag(args, "--byte-order")? {
        config.byte_order = parse_byte_order(&raw)?;
    }
    Ok(config)
}

fn parse_byte_order(raw: &str) -> Result<ByteOrder, String> {
    raw.parse::<ByteOrder>().map_err(|err| err.to_string())
}

fn positional_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else {
            out.push(arg.clone());
        }
    }
    out
}

fn optional_string_flag(args: &[String], flag: &str) -> Result<Option<String>, String> {
    for idx in 0..args.len() {
        if args[idx] == flag {
            if let Some(value) = args.get(idx + 1) {
                return Ok(Some(value.clone()));
            }
            return Err(format!("missing value for {flag}"));
        }
    }
    Ok(None)
}

fn usage() -> String {
    [
        "usage:",
        "  ev_encode none [--byte-order big|little] [--config <path>]",
        "  ev_encode int <i64> [--byte-order big|little] [--config <path>]",
        "  ev_encode double <f64> [--byte-order big|little] [--config <path>]",
        "  ev_encode bool <true|false> [--byte-order big|little] [--config <path>]",
        "  ev_encode string <text> [--byte-order big|little] [--config <path>]",
        "  ev_encode decode <hex> [--byte-order big|little] [--config <path>]",
        "flags may come before or after the command",
    ]
    .join("\n")
}
