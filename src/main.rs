use anyhow::Context;
use clap::Parser;
use img_squeeze_web::cli::{Args, Commands};
use img_squeeze_web::config::{LogFormat, ServerConfig};
use img_squeeze_web::endpoint::EndpointState;
use img_squeeze_web::render::{print_summary, ProgressRenderer};
use img_squeeze_web::server::run_server;
use img_squeeze_web::transport::HttpTransport;
use img_squeeze_web::upload::{collect_upload_files, read_upload_files};
use img_squeeze_web::Orchestrator;
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Serve {
            bind,
            config,
            max_upload_bytes,
            threads,
        } => {
            let mut server_config = ServerConfig::load(config.as_deref())
                .context("Failed to load server configuration")?;
            if let Some(bind) = bind {
                server_config.bind_addr = bind;
            }
            if let Some(limit) = max_upload_bytes {
                server_config.max_upload_bytes = limit;
            }
            if let Some(format) = args.log_format {
                server_config.log.format = format;
            }

            let level = log_level(args.quiet, args.verbose, &server_config.log.level);
            init_logging(&level, server_config.log.format);
            setup_thread_pool(threads);

            run_server(&server_config, EndpointState::default()).await?;
        }
        Commands::Upload {
            inputs,
            server,
            format,
            output,
            recursive,
        } => {
            let level = log_level(args.quiet, args.verbose, "info");
            init_logging(&level, args.log_format.unwrap_or_default());

            upload(inputs, &server, format, output, recursive, args.quiet).await?;
        }
    }

    Ok(())
}

async fn upload(
    inputs: Vec<String>,
    server: &str,
    format: img_squeeze_web::TargetFormat,
    output: Option<PathBuf>,
    recursive: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let paths = collect_upload_files(&inputs, recursive)?;
    if paths.is_empty() {
        println!("⚠️  No files found in the input path");
        return Ok(());
    }

    let files = read_upload_files(&paths).context("Failed to read input files")?;
    if files.is_empty() {
        println!("⚠️  None of the selected files is an image");
        return Ok(());
    }

    println!("🚀 Uploading {} file(s) to {} as {}", files.len(), server, format);

    let renderer = if quiet {
        ProgressRenderer::hidden()
    } else {
        ProgressRenderer::new()
    };
    let transport = HttpTransport::new(server)?;
    let mut orchestrator = Orchestrator::new(transport).with_observer(Arc::new(renderer));

    let summary = orchestrator.submit_batch(files, format).await;
    let jobs = orchestrator.state().snapshot();

    if let Some(dir) = output {
        for (index, job) in jobs.iter().enumerate() {
            if let Some(result) = job.result() {
                let path = result.save_to(&dir, index)?;
                println!("💾 {} -> {:?}", job.file_name(), path);
            }
        }
    }

    print_summary(&jobs, &summary);
    Ok(())
}

/// `RUST_LOG` wins over the flags; `-q` wins over `-v`.
fn log_level(quiet: bool, verbose: bool, configured: &str) -> String {
    if quiet {
        "warn".to_string()
    } else if verbose {
        "debug".to_string()
    } else {
        configured.to_string()
    }
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn setup_thread_pool(threads: Option<usize>) {
    if let Some(num_threads) = threads {
        if let Err(e) = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            tracing::warn!(error = %e, "Failed to set thread pool size");
        }
    }
}
