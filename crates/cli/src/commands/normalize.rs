//! Normalize command - preview the text that will be published

use anyhow::{Context, Result};
use social_relay_domain::text::Normalizer;
use std::io::{self, Read};

use crate::args::NormalizeArgs;

pub async fn execute(args: NormalizeArgs) -> Result<()> {
    let text = get_input_text(&args)?;
    print!("{}", Normalizer::linkedin().normalize(&text));
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read from stdin")?;
    Ok(text)
}

fn get_input_text(args: &NormalizeArgs) -> Result<String> {
    if let Some(ref text) = args.text {
        return Ok(text.clone());
    }

    match args.file {
        Some(ref path) if path.as_os_str() == "-" => read_stdin(),
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        // Default to stdin if no input specified
        None => read_stdin(),
    }
}
