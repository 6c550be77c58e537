use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use kinship_core::export::{ExportConfig, ExportFormat, Exporter};
use kinship_core::history::HistoryFileRecorder;
use kinship_core::io::{load_tsv_matrix, read_id_file, read_tsv_matrix};
use kinship_core::matrix::{DenseBlockMatrix, DEFAULT_ROWS_PER_BLOCK};

#[derive(Parser)]
#[command(name = "kinship")]
#[command(version)]
#[command(about = "Export kinship matrices to PLINK and GCTA relationship formats")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Full matrix with a header of sample IDs
    Tsv,
    /// PLINK .rel (lower triangle)
    Rel,
    /// GCTA .grm text
    Grm,
    /// GCTA .grm.bin
    GrmBin,
    /// PLINK .id sample list
    Id,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a kinship matrix stored as a tab-delimited file
    Export {
        /// Path to the matrix (header of sample IDs, then N rows of N values)
        #[arg(short, long)]
        matrix: PathBuf,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Format,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Also write a .grm.N.bin file (grm-bin only)
        #[arg(long)]
        n_file: Option<PathBuf>,

        /// Number of variants the matrix was computed from
        #[arg(long, default_value = "0")]
        n_variants: u64,

        /// Keep only the samples listed in this .id file
        #[arg(long)]
        keep: Option<PathBuf>,

        /// Rows per block when streaming the matrix
        #[arg(long, default_value_t = DEFAULT_ROWS_PER_BLOCK)]
        rows_per_block: usize,

        /// JSON export configuration (atomic, parallel_blocks, buffer_capacity)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write <output>.history.txt describing the export
        #[arg(long)]
        history: bool,
    },

    /// Summarize a kinship matrix stored as a tab-delimited file
    Info {
        /// Path to the matrix
        #[arg(short, long)]
        matrix: PathBuf,

        /// Tolerance for the symmetry check
        #[arg(long, default_value = "1e-9")]
        tolerance: f64,

        /// Output format: "text" (default) or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            matrix,
            format,
            output,
            n_file,
            n_variants,
            keep,
            rows_per_block,
            config,
            history,
        } => cmd_export(ExportArgs {
            matrix,
            format,
            output,
            n_file,
            n_variants,
            keep,
            rows_per_block,
            config,
            history,
        }),
        Commands::Info {
            matrix,
            tolerance,
            format,
        } => cmd_info(&matrix, tolerance, &format),
    }
}

struct ExportArgs {
    matrix: PathBuf,
    format: Format,
    output: PathBuf,
    n_file: Option<PathBuf>,
    n_variants: u64,
    keep: Option<PathBuf>,
    rows_per_block: usize,
    config: Option<PathBuf>,
    history: bool,
}

fn cmd_export(args: ExportArgs) -> Result<()> {
    let mut km = load_tsv_matrix(&args.matrix, args.n_variants, args.rows_per_block)
        .with_context(|| format!("Failed to load matrix from '{}'", args.matrix.display()))?;

    eprintln!(
        "Loaded {0}x{0} kinship matrix from '{1}'",
        km.n_samples(),
        args.matrix.display()
    );

    if let Some(keep_path) = &args.keep {
        let ids = read_id_file(keep_path)
            .with_context(|| format!("Failed to read sample list '{}'", keep_path.display()))?;
        km = km
            .filter_sample_ids(&ids)
            .context("Failed to filter samples")?;
        eprintln!("Kept {} of {} listed samples", km.n_samples(), ids.len());
    }

    let export_config = match &args.config {
        Some(path) => ExportConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
        None => ExportConfig::default(),
    };

    if args.n_file.is_some() && !matches!(args.format, Format::GrmBin) {
        log::warn!("--n-file is only used with --format grm-bin; ignoring it");
    }

    let format = match args.format {
        Format::Tsv => ExportFormat::Tsv,
        Format::Rel => ExportFormat::Rel,
        Format::Grm => ExportFormat::GctaGrm,
        Format::GrmBin => ExportFormat::GctaGrmBin {
            n_file: args.n_file.clone(),
        },
        Format::Id => ExportFormat::IdFile,
    };

    let mut exporter = Exporter::new(&km).config(export_config);
    if args.history {
        exporter = exporter.recorder(HistoryFileRecorder);
    }
    exporter
        .export(&format, &args.output)
        .with_context(|| format!("{} to '{}' failed", format.operation(), args.output.display()))?;

    eprintln!("Wrote {} to '{}'", format.extension(), args.output.display());
    Ok(())
}

fn cmd_info(matrix_path: &Path, tolerance: f64, output_format: &str) -> Result<()> {
    let (ids, m) = read_tsv_matrix(matrix_path)
        .with_context(|| format!("Failed to load matrix from '{}'", matrix_path.display()))?;
    let n = ids.len();
    let backend = DenseBlockMatrix::new(m, DEFAULT_ROWS_PER_BLOCK)
        .context("Matrix is not square")?;
    let symmetric = backend.is_symmetric(tolerance);
    let diag: Vec<f64> = (0..n).map(|i| backend.as_matrix()[(i, i)]).collect();
    let mean_diag = if n > 0 {
        diag.iter().sum::<f64>() / n as f64
    } else {
        0.0
    };

    match output_format.to_lowercase().as_str() {
        "json" => {
            let value = serde_json::json!({
                "n_samples": n,
                "symmetric": symmetric,
                "mean_diagonal": mean_diag,
                "first_samples": ids.iter().take(5).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        _ => {
            println!("Samples:       {}", n);
            println!("Symmetric:     {}", symmetric);
            println!("Mean diagonal: {:.4}", mean_diag);
            println!("\nFirst samples:");
            for (i, id) in ids.iter().take(5).enumerate() {
                println!("  {}: {:.4}", id, diag[i]);
            }
        }
    }

    if !symmetric {
        log::warn!(
            "Matrix '{}' is not symmetric within {}",
            matrix_path.display(),
            tolerance
        );
    }
    Ok(())
}
