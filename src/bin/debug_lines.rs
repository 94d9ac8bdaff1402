use docx_targets::extractor::{is_center_marker, is_target_marker, split_lines, TargetScanner};
use docx_targets::{read_text, ReaderOptions};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_lines <docx_path> [--tables]");
        std::process::exit(1);
    }

    let options = ReaderOptions {
        include_tables: args.iter().skip(2).any(|a| a == "--tables"),
    };

    let text = match read_text(&args[1], &options) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut scanner = TargetScanner::new();
    for (i, line) in split_lines(&text).into_iter().enumerate() {
        let flags = format!(
            "{}{}",
            if is_target_marker(line) { 'T' } else { '.' },
            if is_center_marker(line) { 'C' } else { '.' }
        );
        let emitted = scanner
            .feed(line)
            .map(|r| format!("  -> {} [{}]", r.target_id, r.center_text))
            .unwrap_or_default();
        println!("{:5} {} {:?}{}", i + 1, flags, line, emitted);
    }

    let stats = scanner.finish();
    println!();
    println!("{:#?}", stats);
}
