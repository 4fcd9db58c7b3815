use std::path::Path;

use clap::{arg, crate_version, Command};

const RCH: &str = "unreachable was reached";

/// Bold-red ANSI wrapping for a fatal error line, matching the original
/// program's terminal output.
fn bold_red(msg: &str) -> String {
    format!("\x1b[1;31m{}\x1b[0m", msg)
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    env_logger::init();

    let long_help =
"Examples:
---------
Compress:      `lzwc compress -r my_file.txt`
Decompress:    `lzwc decompress my_file.lzwc`";

    let mut main_cmd = Command::new("lzwc")
        .about("Compress and expand files with a variable-width LZW codec")
        .after_long_help(long_help)
        .arg_required_else_help(true)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(
        Command::new("compress")
            .arg(arg!(-r --reset "reset the dictionary once it fills at maximum codeword width"))
            .arg(arg!(<FILES> ... "files to compress"))
            .about("compress one or more files"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("decompress")
            .arg(arg!(<FILES> ... "files to decompress"))
            .about("decompress one or more files"),
    );

    let matches = main_cmd.get_matches();
    let mut failed = false;

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let reset = cmd.get_flag("reset");
        let files = cmd.get_many::<String>("FILES").expect(RCH);
        for file in files {
            if let Err(msg) = compress_one(Path::new(file), reset) {
                eprintln!("{}", bold_red(&msg));
                failed = true;
            }
        }
    }

    if let Some(cmd) = matches.subcommand_matches("decompress") {
        let files = cmd.get_many::<String>("FILES").expect(RCH);
        for file in files {
            if let Err(msg) = decompress_one(Path::new(file)) {
                eprintln!("{}", bold_red(&msg));
                failed = true;
            }
        }
    }

    if failed {
        1
    } else {
        0
    }
}

/// Compresses `path` unless it is already compressed, in which case it is
/// skipped with a notice rather than treated as an error.
fn compress_one(path: &Path, reset: bool) -> Result<(), String> {
    if has_extension(path, lzwc::EXT_COMPRESSED) {
        println!("{} is already compressed; skipping...", path.display());
        return Ok(());
    }
    log::debug!("compressing {}", path.display());
    let (in_size, out_size) = lzwc::lzw::compress_file(path, reset).map_err(|e| format!("{}: {}", path.display(), e))?;
    log::info!("compressed {} ({} bytes) into {} bytes", path.display(), in_size, out_size);
    Ok(())
}

/// Decompresses `path` unless its extension doesn't mark it as compressed
/// output, in which case it is skipped with a notice rather than treated as
/// an error.
fn decompress_one(path: &Path) -> Result<(), String> {
    if !has_extension(path, lzwc::EXT_COMPRESSED) {
        println!("{} is not compressed; skipping...", path.display());
        return Ok(());
    }
    log::debug!("decompressing {}", path.display());
    let (in_size, out_size) = lzwc::lzw::decompress_file(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    log::info!("decompressed {} ({} bytes) into {} bytes", path.display(), in_size, out_size);
    Ok(())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().map(|e| e == ext).unwrap_or(false)
}
