use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use brix_codecs::{codec_by_name, DefaultRegistry, ZstdStreamEngine};
use brix_core::format::DEFAULT_BLOCK_SIZE_ID;
use brix_core::stream::{load_dictionary, BlockFormatHandler, CompressSession, DecompressSession};
use brix_core::Writer;

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "brix",
    about = "Block-oriented streaming compression container",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into the block container format
    Compress {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes stdout)
        output: PathBuf,
        /// Codec to use: lz4 | deflate | zstd
        #[arg(short, long, default_value = "zstd")]
        codec: String,
        /// Block size descriptor 0..=6 (block size = 1 KB << N)
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE_ID)]
        block_size_id: u8,
    },
    /// Decompress any mix of concatenated block-format and zstd frames
    Decompress {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes stdout)
        output: PathBuf,
        /// Priming dictionary, when the stream was packed with one
        #[arg(long)]
        dict: Option<PathBuf>,
    },
    /// Compress files as zstd frames through one shared session
    ///
    /// With several inputs the session's dictionary and buffers are loaded
    /// once and reused; each output is its input name plus the suffix.
    Pack {
        /// Source files
        inputs: Vec<PathBuf>,
        /// Explicit destination (single input only; "-" writes stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Zstd compression level
        #[arg(short, long, default_value_t = 3)]
        level: i32,
        /// Suffix appended to each input name
        #[arg(long, default_value = ".brx")]
        suffix: String,
        /// Priming dictionary shared by every frame
        #[arg(long)]
        dict: Option<PathBuf>,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn is_stdio(path: &Path) -> bool {
    path.to_str() == Some("-")
}

fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if is_stdio(path) {
        Ok(Box::new(io::stdin()))
    } else {
        let file = File::open(path).with_context(|| format!("opening input file {path:?}"))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

fn create_output(path: &Path) -> anyhow::Result<Box<dyn Write>> {
    if is_stdio(path) {
        Ok(Box::new(io::stdout()))
    } else {
        let file = File::create(path).with_context(|| format!("creating output file {path:?}"))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

fn load_dict_arg(dict: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match dict {
        Some(path) => Ok(load_dictionary(path)?),
        None => Ok(Vec::new()),
    }
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(
    input: PathBuf,
    output: PathBuf,
    codec_name: &str,
    block_size_id: u8,
) -> anyhow::Result<()> {
    let codec = codec_by_name(codec_name).with_context(|| {
        format!("unknown codec '{codec_name}'. Valid options: lz4, deflate, zstd")
    })?;
    let codec_display = codec.name();

    let mut src = open_input(&input)?;
    let dst = create_output(&output)?;
    let mut writer = Writer::new(dst, codec, block_size_id)?;

    let t0 = Instant::now();
    let mut raw_size = 0u64;
    let mut buf = vec![0u8; writer.block_size()];
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            break;
        }
        raw_size += n as u64;
        writer.write(&buf[..n])?;
    }
    let compressed_size = writer.finish()?;
    let elapsed = t0.elapsed();

    eprintln!("  codec       : {}", codec_display);
    eprintln!("  block size  : {}", human_bytes(1024u64 << block_size_id));
    eprintln!("  raw size    : {}", human_bytes(raw_size));
    eprintln!("  compressed  : {}", human_bytes(compressed_size));
    eprintln!(
        "  ratio       : {:.2}x",
        raw_size as f64 / compressed_size as f64
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decompress(input: PathBuf, output: PathBuf, dict: Option<PathBuf>) -> anyhow::Result<()> {
    let dict = load_dict_arg(dict.as_deref())?;
    let mut session = DecompressSession::new(
        Box::new(ZstdStreamEngine),
        dict,
        Some(Box::new(BlockFormatHandler::new(DefaultRegistry))),
    );

    let mut src = open_input(&input)?;
    let mut dst = create_output(&output)?;

    let t0 = Instant::now();
    let decoded = session.decompress(&mut src, &mut dst)?;
    dst.flush()?;
    let elapsed = t0.elapsed();

    eprintln!("  decoded     : {}", human_bytes(decoded));
    eprintln!(
        "  throughput  : {}/s",
        human_bytes((decoded as f64 / elapsed.as_secs_f64()) as u64)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_pack(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    level: i32,
    suffix: &str,
    dict: Option<PathBuf>,
) -> anyhow::Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("no input files given");
    }
    if output.is_some() && inputs.len() > 1 {
        anyhow::bail!("--output only applies to a single input");
    }

    let dict = load_dict_arg(dict.as_deref())?;
    let mut session = CompressSession::new(Box::new(ZstdStreamEngine), level, dict);

    for input in &inputs {
        let (mut src, size_hint): (Box<dyn Read>, Option<u64>) = if is_stdio(input) {
            (Box::new(io::stdin()), None)
        } else {
            let file =
                File::open(input).with_context(|| format!("opening input file {input:?}"))?;
            let size = file.metadata().ok().map(|m| m.len());
            (Box::new(BufReader::new(file)), size)
        };

        let dst_path = match &output {
            Some(path) => path.clone(),
            None => {
                let mut name = input.as_os_str().to_owned();
                name.push(suffix);
                PathBuf::from(name)
            }
        };
        let mut dst = create_output(&dst_path)?;

        let t0 = Instant::now();
        let (raw, compressed) = session.compress(&mut src, &mut dst, size_hint)?;
        dst.flush()?;
        let elapsed = t0.elapsed();

        eprintln!(
            "  {} -> {} : {} -> {} ({:.2}%) in {:.3}s",
            input.display(),
            dst_path.display(),
            human_bytes(raw),
            human_bytes(compressed),
            compressed as f64 / raw.max(1) as f64 * 100.0,
            elapsed.as_secs_f64()
        );
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Compress {
            input,
            output,
            codec,
            block_size_id,
        } => run_compress(input, output, &codec, block_size_id),
        Commands::Decompress {
            input,
            output,
            dict,
        } => run_decompress(input, output, dict),
        Commands::Pack {
            inputs,
            output,
            level,
            suffix,
            dict,
        } => run_pack(inputs, output, level, &suffix, dict),
    }
}
