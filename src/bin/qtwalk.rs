use anyhow::Context;
use clap::{ArgAction, Parser};
use qtwalk::{
    Atom, Extraction, Program, SampleDescription, compile_lines,
    known_boxes::KnownAtom,
    util::hex_dump,
};
use serde::Serialize;
use std::fs;
use tracing_subscriber::EnvFilter;

const DEFAULT_PROGRAM: &str = "step into moov\nread mvhd";

#[derive(Parser, Debug)]
#[command(version, about = "Extract QuickTime atoms with a read/skip/step-into program")]
struct Args {
    /// QuickTime / MP4 file path
    path: String,

    /// One program line (repeatable), e.g. -e 'step into moov' -e 'read mvhd'
    #[arg(short = 'e', long = "exec", conflicts_with = "program")]
    exec: Vec<String>,

    /// Read the program from a file
    #[arg(short = 'p', long = "program")]
    program: Option<String>,

    /// Emit JSON instead of human-readable text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Hex-dump up to this many bytes of each opaque payload
    #[arg(long, default_value_t = 0)]
    hex: usize,

    /// Print the compiled program before running it
    #[arg(long, action = ArgAction::SetTrue)]
    show_program: bool,

    /// More logging on stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    file: &'a str,
    file_type: &'a qtwalk::FileTypeAtom,
    atoms: &'a [Atom],
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let program: Program = if let Some(p) = &args.program {
        let text = fs::read_to_string(p).with_context(|| format!("reading program {p}"))?;
        text.parse()?
    } else if !args.exec.is_empty() {
        compile_lines(&args.exec)?.into()
    } else {
        DEFAULT_PROGRAM.parse()?
    };

    if args.show_program {
        eprint!("{program}");
    }

    let file = fs::File::open(&args.path).with_context(|| format!("opening {}", args.path))?;
    let mut r = std::io::BufReader::new(file);
    let Extraction { file_type, atoms } =
        qtwalk::execute_with_file_type(&mut r, program.directives())
            .with_context(|| format!("decoding {}", args.path))?;

    if args.json {
        let out = JsonOutput {
            file: &args.path,
            file_type: &file_type,
            atoms: &atoms,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{file_type}");
    for (i, atom) in atoms.iter().enumerate() {
        print_atom(i, atom, args.hex);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_atom(index: usize, atom: &Atom, hex_len: usize) {
    let name = KnownAtom::from(atom.tag()).full_name();
    println!("[{index}] {} ({name})", atom.tag());
    match atom {
        Atom::MovieHeader(mvhd) => {
            println!("  {mvhd}");
            println!(
                "  fps={:.3} duration_secs={}",
                mvhd.fps(),
                mvhd.duration_secs()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".into())
            );
        }
        Atom::SampleTable(stsd) => {
            println!("  {stsd}");
            for vsd in stsd.entries().iter().filter_map(SampleDescription::as_video) {
                if let Some(colr) = vsd.color_info() {
                    println!(
                        "    colr {} primaries={} transfer={} matrix={}",
                        colr.parameter_type(),
                        colr.primaries_index(),
                        colr.transfer_function_index(),
                        colr.matrix_index()
                    );
                }
                if let Some(avcc) = vsd.avc_config() {
                    println!(
                        "    avcC profile={:?} level={:?} nal_length_size={:?}",
                        avcc.profile_indication(),
                        avcc.level_indication(),
                        avcc.nal_length_size()
                    );
                }
            }
        }
        Atom::Generic(g) => {
            println!("  {g}");
            if hex_len > 0 {
                for line in hex_dump(g.payload(), hex_len).lines() {
                    println!("    {line}");
                }
            }
        }
    }
}
