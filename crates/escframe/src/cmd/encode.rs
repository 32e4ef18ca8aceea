use std::fs;

use escframe_frame::FrameWriter;

use crate::cmd::{EncodeArgs, FramingArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};

pub fn run(args: EncodeArgs, framing: &FramingArgs) -> CliResult<i32> {
    let config = framing.to_config()?;
    let payload = resolve_payload(&args)?;

    if args.hex {
        let mut writer = FrameWriter::with_config(Vec::new(), config);
        writer
            .send(&payload)
            .map_err(|err| frame_error("encode failed", err))?;
        println!("{}", hex::encode(writer.into_inner()));
    } else {
        let stdout = std::io::stdout();
        let mut writer = FrameWriter::with_config(stdout.lock(), config);
        writer
            .send(&payload)
            .map_err(|err| frame_error("encode failed", err))?;
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}
