//! Build-time helper that substitutes `{{ VAR }}` placeholders in static
//! frontend assets with values from the environment.
//!
//! Usage: inject-env <input> [output]
//!
//! Missing variables substitute as empty strings with a warning, so a build
//! without credentials still produces a loadable file.

use std::env;
use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};

const PLACEHOLDERS: &[&str] = &["SUPABASE_URL", "SUPABASE_ANON_KEY"];

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("inject-env: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let input = args.next().context("usage: inject-env <input> [output]")?;
    let output = args.next().unwrap_or_else(|| input.clone());

    let template = fs::read_to_string(&input).with_context(|| format!("reading {}", input))?;
    let rendered = inject(&template, |name| env::var(name).ok());

    fs::write(&output, rendered).with_context(|| format!("writing {}", output))?;
    Ok(())
}

fn inject(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut rendered = template.to_string();
    for name in PLACEHOLDERS {
        let value = match lookup(name) {
            Some(v) => v,
            None => {
                eprintln!("inject-env: warning: {} is not set, substituting empty", name);
                String::new()
            }
        };
        for pattern in [format!("{{{{ {} }}}}", name), format!("{{{{{}}}}}", name)] {
            rendered = rendered.replace(&pattern, &value);
        }
    }
    rendered
}
