use crate::config::LogFormat;
use crate::constants::DEFAULT_SERVER_URL;
use crate::formats::TargetFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-squeeze-web",
    about = "Image compression endpoint and multi-file upload client",
    long_about = "img-squeeze-web runs an HTTP endpoint that re-encodes uploaded images \
                  (JPEG and WebP at quality 70, PNG losslessly at maximum effort) and a client \
                  that uploads a batch of images to it one at a time, showing progress per file.",
    version,
    after_help = "EXAMPLES:\n  \
    img-squeeze-web serve --bind 0.0.0.0:3000\n  \
    img-squeeze-web upload photo.jpg shots/ -f webp -o ./compressed\n  \
    img-squeeze-web upload \"./images/*.png\" -s http://localhost:3000 -f png"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short = 'q', long, global = true, help = "Only log warnings and errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_enum,
        help = "Log output format (pretty, json)"
    )]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Run the compression endpoint",
        long_about = "Serve POST /api/compress. Settings come from defaults, an optional TOML file, \
                      IMG_SQUEEZE_* environment variables and finally these flags."
    )]
    Serve {
        #[arg(short = 'b', long, help = "Address to bind, e.g. 127.0.0.1:3000")]
        bind: Option<String>,

        #[arg(short = 'c', long, help = "Path to a TOML configuration file")]
        config: Option<PathBuf>,

        #[arg(long, help = "Maximum accepted request body in bytes")]
        max_upload_bytes: Option<usize>,

        #[arg(
            short = 'j',
            long,
            help = "Number of encoder threads (default: auto)",
            long_help = "Size of the thread pool used by the PNG optimizer. \
                         If not specified, uses number of CPU cores."
        )]
        threads: Option<usize>,
    },

    #[command(
        about = "Compress a batch of images through a running endpoint",
        long_about = "Upload files one at a time, in order, to the compression endpoint. \
                      Files whose type is not an image are skipped. Results are written to the \
                      output directory as compressed-<index>.<ext>."
    )]
    Upload {
        #[arg(
            required = true,
            help = "Files, directories, or glob patterns",
            long_help = "Input can be file paths, directory paths, or glob expressions. \
                         Examples: photo.jpg, ./images, './images/*.png'"
        )]
        inputs: Vec<String>,

        #[arg(
            short = 's',
            long,
            default_value = DEFAULT_SERVER_URL,
            help = "Base URL of the compression endpoint"
        )]
        server: String,

        #[arg(
            short = 'f',
            long,
            value_enum,
            default_value_t = TargetFormat::Jpeg,
            help = "Output format for the whole batch"
        )]
        format: TargetFormat,

        #[arg(short = 'o', long, help = "Directory to write compressed files to")]
        output: Option<PathBuf>,

        #[arg(short = 'r', long, help = "Walk directories recursively")]
        recursive: bool,
    },
}
