//! CLI tool for DOCX target coordinates to CSV conversion

use docx_targets::{
    process_docx_with_options, write_csv, CsvOptions, DocxError, DocxProcessResult, ReaderOptions,
    TargetRecord, DEFAULT_OUTPUT_NAME,
};
use serde::Serialize;
use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process;
use tracing_subscriber::EnvFilter;

const FLAGS: [&str; 3] = ["--json", "--tables", "--stdout"];

#[derive(Serialize)]
struct JsonReport<'a> {
    row_count: usize,
    paragraph_count: usize,
    processing_time_ms: u64,
    records: &'a [TargetRecord],
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <docx_file> [output_csv] [--tables]", program);
    eprintln!("       {} <docx_file> --stdout [--tables]", program);
    eprintln!("       {} <docx_file> --json [--tables]", program);
    eprintln!();
    eprintln!("Extracts Target<N> / Center: x m; y m; z m pairs into a CSV table.");
    eprintln!("Default output file: {}", DEFAULT_OUTPUT_NAME);
    process::exit(1);
}

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("docx2csv");

    let (flags, positional): (Vec<&str>, Vec<&str>) = args
        .iter()
        .skip(1)
        .map(String::as_str)
        .partition(|a| a.starts_with("--"));

    if positional.is_empty() || positional.len() > 2 {
        usage(program);
    }
    if let Some(unknown) = flags.iter().find(|f| !FLAGS.contains(*f)) {
        eprintln!("Unknown option: {}", unknown);
        usage(program);
    }

    let docx_path = positional[0];
    let output_path = positional.get(1).copied().unwrap_or(DEFAULT_OUTPUT_NAME);
    let json_output = flags.contains(&"--json");
    let to_stdout = flags.contains(&"--stdout");
    let options = ReaderOptions {
        include_tables: flags.contains(&"--tables"),
    };

    match process_docx_with_options(docx_path, &options) {
        Ok(result) => {
            let written = if json_output {
                print_json(&result)
            } else if to_stdout {
                write_csv(&result.records, io::stdout().lock(), &CsvOptions::default())
                    .map_err(|e| e.to_string())
            } else {
                print_report(docx_path, output_path, &result)
            };

            if let Err(e) = written {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            if json_output {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            } else {
                eprintln!("{}", failure_message(&e));
            }
            process::exit(exit_code(&e));
        }
    }
}

/// Legacy documents are a warning the user can act on; anything else failed
fn failure_message(e: &DocxError) -> String {
    if e.is_unsupported_format() {
        format!("Warning: {}", e)
    } else {
        format!("An error occurred: {}", e)
    }
}

fn exit_code(e: &DocxError) -> i32 {
    if e.is_unsupported_format() {
        2
    } else {
        1
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn print_json(result: &DocxProcessResult) -> Result<(), String> {
    let report = JsonReport {
        row_count: result.records.len(),
        paragraph_count: result.paragraph_count,
        processing_time_ms: result.processing_time_ms,
        records: &result.records,
    };
    let json = serde_json::to_string(&report).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn print_report(
    docx_path: &str,
    output_path: &str,
    result: &DocxProcessResult,
) -> Result<(), String> {
    println!("DOCX Target Extraction");
    println!("======================");
    println!("File: {}", docx_path);
    println!("Paragraphs: {}", result.paragraph_count);
    println!("Processing time: {}ms", result.processing_time_ms);
    println!();

    if result.is_empty() {
        println!("No target data found in the document.");
        return Ok(());
    }

    print_table(&result.records);
    println!();

    let file = File::create(output_path).map_err(|e| format!("{}: {}", output_path, e))?;
    write_csv(&result.records, BufWriter::new(file), &CsvOptions::default())
        .map_err(|e| e.to_string())?;

    println!("CSV written to: {}", output_path);
    println!("Rows: {}", result.records.len());
    Ok(())
}

fn print_table(records: &[TargetRecord]) {
    let rows: Vec<[&str; 5]> = records
        .iter()
        .map(|r| [&r.target_id, &r.center_text, &r.x, &r.y, &r.z].map(String::as_str))
        .collect();

    let mut widths = docx_targets::export::HEADER.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let print_row = |cells: &[&str; 5]| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        println!("{}", line.join("  ").trim_end());
    };

    print_row(&docx_targets::export::HEADER);
    for row in &rows {
        print_row(row);
    }
}
