//! nel3d CLI - Tool for inspecting NeL 3D asset files.

use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::sync::Arc;

use nel3d::{load_file_with_options, load_files, Asset, LoadOptions, Record, RecordRef};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Global flags split from the command and its arguments.
struct Cli<'a> {
    level: &'static str,
    options: LoadOptions,
    args: Vec<&'a str>,
}

fn parse_args(args: &[String]) -> Cli<'_> {
    let mut level = "info";
    let mut strict = false;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            "--strict" => strict = true,
            _ => filtered_args.push(arg),
        }
    }
    let options = LoadOptions::default();
    Cli {
        level,
        options: if strict { options.strict() } else { options },
        args: filtered_args,
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let Cli {
        level,
        options,
        args: filtered_args,
    } = parse_args(&args);
    init_tracing(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        // Info command - summary of one or more files
        "info" | "i" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: nel3d info <file>...");
                std::process::exit(1);
            }
            cmd_info(&filtered_args[1..], &options);
        }

        // Tree command - shared record graph
        "tree" | "t" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: nel3d tree <file>");
                std::process::exit(1);
            }
            cmd_tree(filtered_args[1], &options);
        }

        // Dump command - full record as JSON
        "dump" | "d" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: nel3d dump <file>");
                std::process::exit(1);
            }
            cmd_dump(filtered_args[1], &options);
        }

        "help" | "h" | "-h" | "--help" => print_help(),

        // Default: if file exists, show info; otherwise error
        _ => {
            if Path::new(filtered_args[0]).exists() {
                cmd_info(&filtered_args, &options);
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    }
}

fn print_help() {
    println!("nel3d - NeL 3D asset inspector");
    println!();
    println!("USAGE:");
    println!("    nel3d [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info   <file>...           Show container, root record and load statistics");
    println!("    t, tree   <file>              Show the shared record graph");
    println!("    d, dump   <file>              Dump the decoded root record as JSON");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!("    --strict         Reject files with bytes after the root record");
    println!();
    println!("EXAMPLES:");
    println!("    nel3d info shapes/*.shape            # Decode many files in parallel");
    println!("    nel3d tree tr_mo_kitin.skel          # See what a shape references");
    println!("    nel3d dump fo_s2_tree.ig > ig.json   # Export an instance group");
    println!();
    println!("NOTES:");
    println!("    - Passing files directly is equivalent to 'info'");
    println!("    - RUST_LOG overrides the log filter (e.g. RUST_LOG=nel3d=trace)");
}

fn open(path: &str, options: &LoadOptions) -> Asset {
    match load_file_with_options(path, options) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn cmd_info(paths: &[&str], options: &LoadOptions) {
    let mut failed = 0;
    for (path, result) in load_files(paths, options) {
        match result {
            Ok(asset) => {
                let s = &asset.stats;
                println!("File: {}", path.display());
                println!("  Format:   {}", s.format);
                println!("  Root:     {} (version {})", asset.root.type_tag(), asset.root.version());
                println!("  Bytes:    {} consumed, {} trailing", s.bytes_consumed, s.trailing_bytes);
                println!("  Records:  {} shared, {} back-references", s.records_decoded, s.cache_hits);
                if s.lossy_strings > 0 {
                    println!("  Strings:  {} recovered lossily", s.lossy_strings);
                }
                if let Some(extra) = describe(&asset.root) {
                    println!("  {}", extra);
                }
                println!();
            }
            Err(e) => {
                failed += 1;
                eprintln!("Failed to open {}: {}", path.display(), e);
            }
        }
    }
    if failed > 0 {
        std::process::exit(1);
    }
}

/// One-line summary of the interesting counts of a root record.
fn describe(record: &Record) -> Option<String> {
    let text = match record {
        Record::Mesh(m) => format!(
            "Mesh:     {} vertices, {} materials",
            m.geom.vertex_buffer.header.num_vertices,
            m.base.materials.len()
        ),
        Record::MeshMrm(m) => format!(
            "MRM:      {} lods, {} materials",
            m.geom.lods.len(),
            m.base.materials.len()
        ),
        Record::MeshMrmSkinned(m) => format!(
            "MRM:      {} lods, {} bones",
            m.geom.lods.len(),
            m.geom.bones_name.len()
        ),
        Record::MeshMultiLod(m) => format!("Slots:    {}", m.slots.len()),
        Record::SkeletonShape(s) => {
            format!("Bones:    {} ({} lods)", s.bones.len(), s.lods.len())
        }
        Record::Animation(a) => format!("Tracks:   {}", a.tracks.len()),
        Record::InstanceGroup(ig) => format!(
            "Group:    {} instances, {} clusters, {} portals, {} lights",
            ig.instances.len(),
            ig.clusters.len(),
            ig.portals.len(),
            ig.point_lights.point_lights.len()
        ),
        _ => return None,
    };
    Some(text)
}

fn cmd_tree(path: &str, options: &LoadOptions) {
    let asset = open(path, options);
    println!("File: {}", asset.path.display());
    println!();
    let mut seen = HashSet::new();
    print_tree(&asset.root, None, 0, &mut seen);
}

fn print_tree(
    record: &RecordRef,
    label: Option<&str>,
    depth: usize,
    seen: &mut HashSet<*const Record>,
) {
    let indent = "  ".repeat(depth);
    let label = label.map(|l| format!("{l}: ")).unwrap_or_default();
    let key = Arc::as_ptr(record);
    if !seen.insert(key) {
        println!("{}{}{} (shared, see above)", indent, label, record.type_tag());
        return;
    }
    println!("{}{}{} v{}", indent, label, record.type_tag(), record.version());

    if let Record::Animation(anim) = record.as_ref() {
        // Tracks are labelled by channel name
        for (name, &index) in &anim.id_by_name {
            if let Some(Some(track)) = anim.tracks.get(index as usize) {
                print_tree(track, Some(name.as_str()), depth + 1, seen);
            }
        }
        return;
    }
    for child in record.children() {
        print_tree(child, None, depth + 1, seen);
    }
}

fn cmd_dump(path: &str, options: &LoadOptions) {
    let asset = open(path, options);
    match serde_json::to_string_pretty(asset.root.as_ref()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize {}: {}", path, e);
            std::process::exit(1);
        }
    }
}
