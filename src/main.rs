use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use source_ingest::splitter::LineEndStyle;
use source_ingest::{EncodingChoice, Options, SourceData, TextEncoding};

const USAGE: &str = "usage: source-ingest [--options FILE] [--encoding NAME] [--no-auto-detect] \
[--ignore-comments] [--ignore-case] [--log FILE] <PATH|URL|->";

#[derive(Debug, Default)]
struct Args {
    options_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    encoding: Option<String>,
    no_auto_detect: bool,
    ignore_comments: bool,
    ignore_case: bool,
    input: String,
}

fn flag_value(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    it.next()
        .filter(|value| !value.starts_with("--"))
        .ok_or_else(|| format!("{flag} needs a value\n{USAGE}"))
}

fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    let mut input = None;
    let mut it = argv.into_iter();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--options" => args.options_file = Some(PathBuf::from(flag_value(&mut it, &arg)?)),
            "--log" => args.log_file = Some(PathBuf::from(flag_value(&mut it, &arg)?)),
            "--encoding" => args.encoding = Some(flag_value(&mut it, &arg)?),
            "--no-auto-detect" => args.no_auto_detect = true,
            "--ignore-comments" => args.ignore_comments = true,
            "--ignore-case" => args.ignore_case = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            s if s.starts_with("--") => return Err(format!("unknown flag: {s}\n{USAGE}")),
            _ if input.is_some() => return Err(format!("only one input allowed\n{USAGE}")),
            _ => input = Some(arg),
        }
    }

    args.input = input.ok_or_else(|| USAGE.to_string())?;
    Ok(args)
}

fn init_logging(log_file: Option<&PathBuf>) {
    let result = match log_file.map(File::create) {
        Some(Ok(file)) => WriteLogger::init(LevelFilter::Debug, Config::default(), file),
        Some(Err(e)) => {
            eprintln!("cannot open log file: {e}");
            return;
        }
        None => TermLogger::init(
            LevelFilter::Warn,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    };
    if let Err(e) = result {
        eprintln!("logger already initialised: {e}");
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    source: String,
    encoding: Option<&'static str>,
    line_end_style: LineEndStyle,
    is_text: bool,
    incomplete_conversion: bool,
    size_bytes: usize,
    display_lines: usize,
    comparison_lines: usize,
    pure_comment_lines: usize,
    messages: &'a [String],
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };
    init_logging(args.log_file.as_ref());

    let mut options = match &args.options_file {
        Some(path) => match Options::load(path) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::from(2);
            }
        },
        None => Options::default(),
    };
    options.ignore_comments |= args.ignore_comments;
    options.ignore_case |= args.ignore_case;

    let mut choice = EncodingChoice::default();
    if let Some(label) = &args.encoding {
        match TextEncoding::for_label(label) {
            Some(encoding) => choice.encoding = encoding,
            None => {
                eprintln!("unknown encoding: {label}");
                return ExitCode::from(2);
            }
        }
    }
    choice.auto_detect = !args.no_auto_detect;

    let mut source = SourceData::new();
    match args.input.as_str() {
        "-" => {
            let mut data = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut data) {
                eprintln!("cannot read stdin: {e}");
                return ExitCode::FAILURE;
            }
            if let Err(e) = source.set_data(&data) {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
        location => source.set_file(location),
    }

    let report = source.read_and_preprocess(choice, &options);
    report.options_update.apply(&mut options);
    let messages = report.messages();

    let summary = Summary {
        source: source.alias_name(),
        encoding: source.encoding().map(|e| e.name()),
        line_end_style: source.line_end_style(),
        is_text: source.is_text(),
        incomplete_conversion: source.is_incomplete_conversion(),
        size_bytes: source.size_bytes(),
        display_lines: source.size_lines(),
        comparison_lines: source.lines_for_comparison().map_or(0, |l| l.len()),
        pure_comment_lines: source
            .display_lines()
            .map_or(0, |l| l.records()[..l.len()].iter().filter(|r| r.pure_comment).count()),
        messages: &messages,
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("cannot serialise summary: {e}");
            return ExitCode::FAILURE;
        }
    }

    if report.fatal().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
