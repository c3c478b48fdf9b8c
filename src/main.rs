use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use plume::script::default_scripts_dir;
use plume::{ExecutionBudget, ScriptDescriptor, ScriptEngine, ScriptLibrary};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--list") => list_scripts(args.get(2).map(PathBuf::from)),
        Some(script_path) => run_script(Path::new(script_path), args.get(2).map(Path::new)),
        None => {
            eprintln!("usage: plume <script.rhai> [input-file]");
            eprintln!("       plume --list [scripts-dir]");
            ExitCode::FAILURE
        }
    }
}

/// Apply one script to a file (or stdin) and print the result.
fn run_script(script_path: &Path, input: Option<&Path>) -> ExitCode {
    let source = match fs::read_to_string(script_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("failed to read {}: {}", script_path.display(), err);
            return ExitCode::FAILURE;
        }
    };
    let script = match ScriptDescriptor::parse(&source) {
        Ok(script) => script,
        Err(err) => {
            eprintln!("failed to load {}: {}", script_path.display(), err);
            return ExitCode::FAILURE;
        }
    };
    let text = match read_input(input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("failed to read input: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let engine = ScriptEngine::with_budget(ExecutionBudget {
        max_operations: Some(10_000_000),
        timeout: None,
    });
    let name = script.name.clone();
    // The CLI host never has a selection, so the result always replaces
    // the whole document.
    match engine.apply(&script, &text, "", move |message| {
        eprintln!("{name}: {message}");
    }) {
        Ok(result) => {
            print!("{}", result.full_text);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("script failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(input: Option<&Path>) -> io::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Print the scripts discovered in a directory.
fn list_scripts(dir: Option<PathBuf>) -> ExitCode {
    let Some(dir) = dir.or_else(default_scripts_dir) else {
        eprintln!("could not determine the scripts directory");
        return ExitCode::FAILURE;
    };
    let library = match ScriptLibrary::load_dir(&dir) {
        Ok(library) => library,
        Err(err) => {
            eprintln!("failed to read {}: {}", dir.display(), err);
            return ExitCode::FAILURE;
        }
    };

    for script in library.scripts() {
        if script.tags.is_empty() {
            println!("{:<20} {}", script.name, script.description);
        } else {
            println!(
                "{:<20} {} [{}]",
                script.name,
                script.description,
                script.tags.join(", ")
            );
        }
    }
    for (path, err) in library.failures() {
        eprintln!("skipped {}: {}", path.display(), err);
    }
    ExitCode::SUCCESS
}
