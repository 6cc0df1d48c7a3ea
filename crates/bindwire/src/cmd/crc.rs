use bindwire_checksum::{
    append_crc, append_crc2, build_command, verify_checksum, verify_command, NIKOBUS_CRC16,
    NIKOBUS_CRC8,
};

use crate::cmd::{CrcArgs, NikobusArgs};
use crate::exit::{checksum_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_checksum, print_verification, ChecksumOutput, OutputFormat, VerifyOutput};

pub fn run_crc16(args: CrcArgs, format: OutputFormat) -> CliResult<i32> {
    if args.verify {
        let valid = verify_checksum(&args.input, &NIKOBUS_CRC16)
            .map_err(|err| checksum_error("crc16 verification failed", err))?;
        return Ok(report("crc16", &args.input, valid, format));
    }

    let output = append_crc(args.input.as_str())
        .map_err(|err| checksum_error("crc16 failed", err))?
        .unwrap_or_default();
    print_checksum(
        &ChecksumOutput {
            algorithm: "crc16",
            input: &args.input,
            output: &output,
        },
        format,
    );
    Ok(SUCCESS)
}

pub fn run_crc8(args: CrcArgs, format: OutputFormat) -> CliResult<i32> {
    if args.verify {
        let valid = verify_checksum(&args.input, &NIKOBUS_CRC8)
            .map_err(|err| checksum_error("crc8 verification failed", err))?;
        return Ok(report("crc8", &args.input, valid, format));
    }

    let output = append_crc2(&args.input);
    print_checksum(
        &ChecksumOutput {
            algorithm: "crc8",
            input: &args.input,
            output: &output,
        },
        format,
    );
    Ok(SUCCESS)
}

pub fn run_nikobus(args: NikobusArgs, format: OutputFormat) -> CliResult<i32> {
    if args.verify {
        if !args.body.starts_with(&args.prefix) {
            return Err(CliError::new(
                USAGE,
                format!("command {:?} does not start with {:?}", args.body, args.prefix),
            ));
        }
        let valid = verify_command(&args.body, args.prefix.len())
            .map_err(|err| checksum_error("command verification failed", err))?;
        return Ok(report("nikobus", &args.body, valid, format));
    }

    let output = build_command(&args.prefix, &args.body)
        .map_err(|err| checksum_error("command build failed", err))?;
    tracing::debug!(prefix = %args.prefix, command = %output, "built command");
    print_checksum(
        &ChecksumOutput {
            algorithm: "nikobus",
            input: &args.body,
            output: &output,
        },
        format,
    );
    Ok(SUCCESS)
}

fn report(algorithm: &str, input: &str, valid: bool, format: OutputFormat) -> i32 {
    print_verification(
        &VerifyOutput {
            algorithm,
            input,
            valid,
        },
        format,
    );
    if valid {
        SUCCESS
    } else {
        FAILURE
    }
}
