use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_analyzer::parser::{FileSource, ParseOptions};
use pdf_analyzer::reports::{self, DocumentInfo};
use pdf_analyzer::{DecryptionStatus, PdfReader};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Reader = PdfReader<FileSource<File>>;

#[derive(Parser, Debug)]
#[command(
    name = "pdfanalyzer",
    about = "Inspect the internal structure of PDF files",
    version,
    author
)]
struct Cli {
    /// Password for encrypted documents (user or owner)
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Reject files that deviate from the format instead of tolerating them
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Version, object and page counts, encryption and anomalies
    Info {
        /// Input PDF file
        input: PathBuf,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Trailer and every indirect object
    Summary {
        /// Input PDF file
        input: PathBuf,

        /// Output text file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// One indirect object, optionally with its stream data
    Object {
        /// Input PDF file
        input: PathBuf,

        /// Object number
        number: u32,

        /// Also print the stream data
        #[arg(short, long, value_enum)]
        stream: Option<StreamView>,

        /// Print stream data as a hex dump
        #[arg(long)]
        hex: bool,
    },

    /// Content stream of a page
    Contents {
        /// Input PDF file
        input: PathBuf,

        /// Page number, starting at 1
        page: usize,

        /// Annotated operator listing instead of the stream text
        #[arg(long)]
        ops: bool,
    },

    /// Page objects and their content streams
    Pages {
        /// Input PDF file
        input: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StreamView {
    /// Decrypted but still encoded
    Raw,
    /// Filters applied
    Decoded,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pdfanalyzer=debug,pdf_analyzer=debug"
    } else {
        "pdfanalyzer=info,pdf_analyzer=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let options = if cli.strict {
        ParseOptions::strict()
    } else {
        ParseOptions::lenient()
    };
    let password = cli.password.as_deref();

    match cli.command {
        Commands::Info { input, json } => {
            let reader = open(&input, password, options)?;
            let info = DocumentInfo::from_reader(&reader, &display_name(&input));
            if json {
                let text = serde_json::to_string_pretty(&info)
                    .context("Failed to serialize document info")?;
                println!("{text}");
            } else {
                print_info(&info);
            }
        }

        Commands::Summary { input, output } => {
            let reader = open(&input, password, options)?;
            let summary = reports::pdf_file_summary(&reader, &display_name(&input));
            write_output(output.as_deref(), &summary)?;
        }

        Commands::Object {
            input,
            number,
            stream,
            hex,
        } => {
            let mut reader = open(&input, password, options)?;
            print!("{}", reports::object_report(&reader, number)?);

            if let Some(view) = stream {
                require_active(&reader)?;
                let data = match view {
                    StreamView::Raw => reader
                        .read_stream(number)
                        .with_context(|| format!("Failed to read stream of object {number}"))?,
                    StreamView::Decoded => reader
                        .decoded_stream(number)
                        .with_context(|| format!("Failed to decode stream of object {number}"))?
                        .with_context(|| {
                            format!("Stream of object {number} uses an unsupported filter")
                        })?,
                };
                debug!("Stream of object {}: {} bytes", number, data.len());
                println!();
                if hex {
                    print!("{}", reports::byte_array_to_hex(&data));
                } else {
                    print!("{}", reports::byte_array_to_string(&data));
                }
            }
        }

        Commands::Contents { input, page, ops } => {
            let mut reader = open(&input, password, options)?;
            require_active(&reader)?;
            let index = page
                .checked_sub(1)
                .context("Page numbers start at 1")?;
            if ops {
                let listing = reports::page_listing(&mut reader, index)
                    .with_context(|| format!("Failed to list page {page}"))?;
                print!("{listing}");
            } else {
                let contents = reader
                    .page_contents(index)
                    .with_context(|| format!("Failed to read contents of page {page}"))?;
                print!("{}", reports::byte_array_to_string(&contents));
            }
        }

        Commands::Pages { input } => {
            let mut reader = open(&input, password, options)?;
            require_active(&reader)?;
            let pages = match reader.pages() {
                Some(pages) => pages.to_vec(),
                None => bail!("The page tree of {} could not be read", input.display()),
            };
            println!("Pages: {}", pages.len());
            for (index, page) in pages.into_iter().enumerate() {
                let streams = reader
                    .contents_array(page)
                    .with_context(|| format!("Failed to read /Contents of page {}", index + 1))?;
                let streams: Vec<String> = streams.iter().map(|n| format!("{n} 0 R")).collect();
                println!(
                    "Page {}: object {} contents [{}]",
                    index + 1,
                    page,
                    streams.join(" ")
                );
            }
        }
    }

    Ok(())
}

fn open(input: &Path, password: Option<&str>, options: ParseOptions) -> Result<Reader> {
    let reader = PdfReader::open_with_options(input, password, options)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    info!(
        "Opened {}: PDF {}, {} objects",
        input.display(),
        reader.version(),
        reader.object_count()
    );
    for warning in reader.warnings() {
        warn!("{}", warning);
    }
    Ok(reader)
}

fn require_active(reader: &Reader) -> Result<()> {
    match reader.decryption_status() {
        _ if reader.is_active() => Ok(()),
        DecryptionStatus::InvalidPassword => {
            bail!("The document is encrypted; supply the user or owner password with --password")
        }
        DecryptionStatus::Unsupported => bail!("The document uses an unsupported security handler"),
        status => bail!("The document is not readable ({status:?})"),
    }
}

fn display_name(input: &Path) -> String {
    input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Summary written to {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn print_info(info: &DocumentInfo) {
    println!("PDF Information for: {}", info.file_name);
    println!("==========================================");
    println!("PDF Version: {}", info.version);
    println!("Objects: {}", info.object_count);
    println!("Pages: {}", info.page_count);
    println!("Decryption: {:?}", info.decryption_status);
    if let Some(encryption_type) = info.encryption_type {
        println!("Encryption: {encryption_type:?}");
        println!("Permissions: {}", info.permissions.join(", "));
    }
    if info.invalid_file {
        println!("Invalid file: non-conforming constructs were tolerated");
    }
    if info.unsupported_page_tree {
        println!("Page tree: inherited attributes are not applied to the pages");
    }
    for warning in &info.warnings {
        println!("Warning: {warning}");
    }
}
