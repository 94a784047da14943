use lectern_artifact::{
    prepare, resolver, source::extract_component_code, ArtifactError, BoundaryOptions,
    RuntimeAssets, SessionToken,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

struct Args {
    files: Vec<String>,
    out_dir: Option<PathBuf>,
    assets_dir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1).collect()) {
        Some(args) => args,
        None => {
            print_usage();
            process::exit(1);
        }
    };

    let mut options = BoundaryOptions::default();
    if let Some(dir) = &args.assets_dir {
        match RuntimeAssets::from_dir(dir) {
            Ok(assets) => options.assets = assets,
            Err(e) => {
                eprintln!("✗ {}", e);
                process::exit(1);
            }
        }
    }

    let mut exit_code = 0;
    for file_path in &args.files {
        match build_file(file_path, args.out_dir.as_deref(), &options) {
            Ok(report) => println!("✓ {}", report),
            Err(e) => {
                eprintln!("✗ {} failed:", file_path);
                eprintln!("  {}", e);
                exit_code = 1;
            }
        }
    }

    process::exit(exit_code);
}

fn parse_args(raw: Vec<String>) -> Option<Args> {
    let mut files = Vec::new();
    let mut out_dir = None;
    let mut assets_dir = None;
    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => out_dir = Some(PathBuf::from(iter.next()?)),
            "--inline-assets" => assets_dir = Some(PathBuf::from(iter.next()?)),
            "-h" | "--help" => return None,
            _ => files.push(arg),
        }
    }
    if files.is_empty() {
        return None;
    }
    Some(Args {
        files,
        out_dir,
        assets_dir,
    })
}

fn print_usage() {
    eprintln!("Usage: artifact-build <component.jsx>... [--out DIR] [--inline-assets DIR]");
    eprintln!();
    eprintln!("Resolves each component's entry point. With --out, writes <name>.html");
    eprintln!("execution documents. --inline-assets embeds react.js, react-dom.js,");
    eprintln!("babel.js and styling.js from DIR instead of linking them.");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  artifact-build quiz.jsx");
    eprintln!("  artifact-build *.jsx --out build/");
}

fn build_file(
    path: &str,
    out_dir: Option<&Path>,
    options: &BoundaryOptions,
) -> Result<String, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|e| ArtifactError::SourceUnreadable {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let code = extract_component_code(&raw);
    let resolved = resolver::resolve(&code)?;

    let Some(dir) = out_dir else {
        return Ok(format!(
            "{} -> {} ({:?})",
            path, resolved.name, resolved.rule
        ));
    };

    let doc = prepare(&code, SessionToken::generate(), options)?;
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.name.to_string());
    let target = dir.join(format!("{}.html", stem));
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&target, doc.html()))
        .map_err(|e| ArtifactError::DocumentBuild(format!("{}: {}", target.display(), e)))?;

    Ok(format!(
        "{} -> {} ({:?}), wrote {}",
        path,
        resolved.name,
        resolved.rule,
        target.display()
    ))
}
