use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Deserialize)]
struct RegistryFile {
    registry: String,
    entries: Vec<Entry>,
}

#[derive(Deserialize)]
struct Entry {
    name: String,
    /// `(since protocol, id)` pairs; a null id marks removal.
    brackets: Vec<(i32, Option<i32>)>,
}

/// Load every registry JSON file from a directory, sorted by file name.
fn load_from_dir(dir: &Path) -> Vec<RegistryFile> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Cannot read directory {:?}: {}", dir, e))
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort_by_key(|e| e.file_name());
    entries
        .into_iter()
        .map(|entry| {
            let path = entry.path();
            println!("cargo:rerun-if-changed={}", path.display());
            let contents = fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("Cannot read {:?}: {}", path, e));
            serde_json::from_str(&contents)
                .unwrap_or_else(|e| panic!("Invalid JSON in {:?}: {}", path, e))
        })
        .collect()
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let data_dir = Path::new(&manifest_dir)
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("data/registries");
    println!("cargo:rerun-if-changed={}", data_dir.display());
    let out_dir = std::env::var("OUT_DIR").unwrap();

    let registries = load_from_dir(&data_dir);

    let mut out = fs::File::create(Path::new(&out_dir).join("generated.rs")).unwrap();

    writeln!(out, "/// Declarative registry tables, one per JSON file.").unwrap();
    writeln!(out, "pub static RAW_REGISTRIES: &[RawRegistry] = &[").unwrap();
    for registry in &registries {
        writeln!(out, "    RawRegistry {{").unwrap();
        writeln!(out, "        name: {:?},", registry.registry).unwrap();
        writeln!(out, "        entries: &[").unwrap();
        for entry in &registry.entries {
            write!(
                out,
                "            RawEntry {{ name: {:?}, brackets: &[",
                entry.name
            )
            .unwrap();
            for (since, id) in &entry.brackets {
                match id {
                    Some(id) => write!(out, "({}, Some({})), ", since, id).unwrap(),
                    None => write!(out, "({}, None), ", since).unwrap(),
                }
            }
            writeln!(out, "] }},").unwrap();
        }
        writeln!(out, "        ],").unwrap();
        writeln!(out, "    }},").unwrap();
    }
    writeln!(out, "];").unwrap();
}
