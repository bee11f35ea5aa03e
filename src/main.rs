use anyhow::{Context, bail};
use edcore::cli::{self, CliArgs};
use edcore::config::EditorConfig;
use edcore::editor::Editor;

/// Entry point: load the configuration, open the file through the editing
/// core, report what was found and optionally convert and save it.
fn main() -> anyhow::Result<()> {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logger (set RUST_LOG env var to control verbosity)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = load_config(&args)?;
    let mut editor = Editor::new(config);
    for artifact in editor.autosave_leftovers() {
        println!("File exists: {}", artifact.display());
    }

    let Some(path) = args.file.as_deref() else {
        println!("No file given; nothing to do");
        return Ok(());
    };
    let file = editor.open(path);

    if let Some(mode) = args.mode {
        editor.set_line_ending_mode(mode.into());
    }

    let Some(store) = editor.file(file) else {
        bail!("{} was not opened", path.display());
    };
    if args.lines {
        for (row, line) in store.body().enumerate() {
            let text = store.text(line).unwrap_or_default();
            println!("{:>6}  {}", row, String::from_utf8_lossy(text));
        }
    }
    println!(
        "{}: {} lines, mode {}{}",
        store.name(),
        store.row_count(),
        store.mode(),
        if store.is_changed() { ", changed" } else { "" }
    );
    drain_messages(&mut editor);

    if args.save {
        let saved = editor.save();
        drain_messages(&mut editor);
        if !saved {
            bail!("failed to save {}", path.display());
        }
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn load_config(args: &CliArgs) -> anyhow::Result<EditorConfig> {
    let config = match &args.config {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::load_default().context("loading default config")?,
    };
    Ok(args.apply(config))
}

fn drain_messages(editor: &mut Editor) {
    while let Some(message) = editor.take_message() {
        println!("  {}", message);
    }
}
