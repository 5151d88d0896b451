use annotator::{
    save_png, AnnotationDocument, IntensityPipeline, LoadedSlice, Renderer, Session,
    SessionCommand, Window,
};
use clap::{Parser, Subcommand};
use cli::AnnotationJob;
use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print metadata and intensity statistics of a slice
    Info {
        /// Path to the DICOM file
        file: PathBuf,
        /// Annotation JSON to summarise against the slice
        #[arg(long)]
        annotations: Option<PathBuf>,
    },
    /// Render a slice (and optionally saved contours) to PNG
    Render {
        /// Path to the DICOM file
        file: PathBuf,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
        /// Window center, overrides the value stored in the file
        #[arg(long, requires = "width", allow_hyphen_values = true)]
        center: Option<f64>,
        /// Window width, overrides the value stored in the file
        #[arg(long, requires = "center")]
        width: Option<f64>,
        /// Annotation JSON to draw on top of the slice
        #[arg(long)]
        annotations: Option<PathBuf>,
    },
    /// Replay a scripted annotation job and export the contours
    Annotate {
        /// Path to the job file (.toml or .json)
        #[arg(short, long)]
        job: PathBuf,
    },
    /// Print the JSON schema of session commands
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Info { file, annotations } => {
            print_info(file, annotations.as_deref())?;
        }
        Commands::Render {
            file,
            output,
            center,
            width,
            annotations,
        } => {
            let window = match (center, width) {
                (Some(center), Some(width)) => Some(Window::new(*center, *width)?),
                _ => None,
            };
            render(file, output, window, annotations.as_deref())?;
        }
        Commands::Annotate { job } => {
            run_job(job)?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&SessionCommand::schema())?);
        }
    }

    Ok(())
}

fn session_for(window: Option<Window>) -> Session {
    let mut builder = IntensityPipeline::builder();
    if let Some(window) = window {
        builder = builder.with_window(window);
    }
    let pipeline = builder.build();
    info!("{}", pipeline.info());
    Session::new(pipeline)
}

fn print_summaries(document: &AnnotationDocument) {
    for (i, summary) in document.summaries().iter().enumerate() {
        println!("  contour {}: {}", i + 1, summary);
    }
}

fn loaded_slice(session: &Session) -> Result<&LoadedSlice> {
    session.slice().ok_or_else(|| eyre!("No slice loaded"))
}

fn print_info(file: &Path, annotations: Option<&Path>) -> Result<()> {
    let mut session = session_for(None);
    session.load_file(file)?;
    let slice = loaded_slice(&session)?;
    let (min, max) = slice.intensity.range();

    println!("File:            {}", file.display());
    println!("Dimensions:      {}x{}", slice.dimensions.width, slice.dimensions.height);
    println!("Transfer syntax: {}", slice.transfer_syntax);
    println!("Modality:        {}", slice.modality.as_deref().unwrap_or("unknown"));
    println!("Rescale:         slope {}, intercept {}", slice.rescale.slope, slice.rescale.intercept);
    println!("Window:          center {}, width {}", slice.window.center, slice.window.width);
    println!("Intensity range: {} .. {}", min, max);

    if let Some(path) = annotations {
        let document = AnnotationDocument::from_file(path)?;
        document.check_bounds(slice.dimensions)?;
        println!("Annotations:     {} contours in {}", document.len(), path.display());
        print_summaries(&document);
    }
    Ok(())
}

fn render(
    file: &Path,
    output: &Path,
    window: Option<Window>,
    annotations: Option<&Path>,
) -> Result<()> {
    let mut session = session_for(window);
    session.load_file(file)?;

    if let Some(path) = annotations {
        let document = AnnotationDocument::from_file(path)?;
        info!("Drawing {} contours from {:?}", document.len(), path);
        session.import(document)?;
    }

    let frame = Renderer::new()
        .render(&session)
        .ok_or_else(|| eyre!("Nothing to render"))?;
    save_png(&frame, output)?;
    info!("Wrote {:?}", output);
    Ok(())
}

fn run_job(job_path: &Path) -> Result<()> {
    let job = AnnotationJob::from_file(job_path)?;
    info!("Annotation job: {:?}", job.input_path);

    std::fs::create_dir_all(&job.output_dir)?;

    let mut session = session_for(job.window);
    session.load_file(&job.input_path)?;

    for command in &job.commands {
        let outcome = session.handle(*command)?;
        if !outcome.is_applied() {
            warn!("Command '{}' had no effect: {:?}", command, outcome);
        }
    }

    // Render before exporting; export closes the active contour.
    let preview = match &job.preview {
        Some(_) => Renderer::new().render(&session),
        None => None,
    };

    match session.export() {
        Some(export) => {
            let path = export.save_in(&job.output_dir)?;
            info!("Saved {} contours to {:?}", export.document.len(), path);
            for (i, summary) in export.document.summaries().iter().enumerate() {
                info!("Contour {}: {}", i + 1, summary);
            }
        }
        None => warn!("No contour with at least three points; nothing exported"),
    }

    if let (Some(path), Some(frame)) = (&job.preview, preview) {
        save_png(&frame, path)?;
        info!("Wrote preview {:?}", path);
    }

    info!("Annotation job completed");
    Ok(())
}
