use std::io::Read;

use bindwire_teleinfo::{parse_frame_with_config, ParseConfig};

use crate::cmd::TeleinfoArgs;
use crate::exit::{io_error, teleinfo_error, CliResult, SUCCESS};
use crate::output::{print_teleinfo, OutputFormat};

pub fn run(args: TeleinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("cannot read {}", path.display()), err))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| io_error("cannot read stdin", err))?;
            text
        }
    };

    let config = ParseConfig {
        verify_checksums: !args.no_verify,
        require_delimiters: args.require_delimiters,
    };
    let frame = parse_frame_with_config(&raw, &config)
        .map_err(|err| teleinfo_error("teleinfo parse failed", err))?;

    tracing::debug!(
        frame_type = frame.frame_type(),
        adco = frame.adco(),
        "parsed frame"
    );
    print_teleinfo(&frame, format);
    Ok(SUCCESS)
}
