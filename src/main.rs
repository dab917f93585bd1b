//! `orbitfx` binary: opens a window showing a glTF scene through the
//! post-processing chain.
//!
//! Usage: `orbitfx [ASSET] [--options FILE]`
//!
//! `ASSET` overrides the options' `[asset] source`; `--options` loads a TOML
//! preset (missing fields keep their defaults).

use std::path::PathBuf;
use std::process::ExitCode;

use orbitfx::options::Options;
use orbitfx::Viewer;

struct Args {
    asset: Option<PathBuf>,
    options: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        asset: None,
        options: None,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--options" => {
                let file = args.next().ok_or("--options needs a file argument")?;
                parsed.options = Some(PathBuf::from(file));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{flag}'")),
            _ if parsed.asset.is_none() => parsed.asset = Some(PathBuf::from(&arg)),
            _ => return Err(format!("unexpected argument '{arg}'")),
        }
    }
    Ok(parsed)
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            log::error!("{e}");
            log::error!("Usage: orbitfx [ASSET] [--options FILE]");
            return ExitCode::FAILURE;
        }
    };

    let options = match &args.options {
        Some(path) => match Options::load(path) {
            Ok(options) => options,
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Options::default(),
    };

    let mut builder = Viewer::builder().with_options(options);
    if let Some(asset) = args.asset {
        builder = builder.with_asset(asset);
    }

    match builder.build().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
