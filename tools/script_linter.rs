/// Script Linter: validates script catalogs before a game uses them.
///
/// Usage: script_linter <script_file_or_dir> | --builtin

use grimoire_engine::core::roles::ProcessorRegistry;
use grimoire_engine::core::script::{RoleTrait, Script, ScriptCatalog};
use grimoire_engine::schema::seat::Team;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: script_linter <script_file_or_dir> | --builtin");
        process::exit(0);
    }

    let catalog = if args[1] == "--builtin" {
        match ScriptCatalog::builtin() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to load built-in scripts: {}", e);
                process::exit(1);
            }
        }
    } else {
        load_catalog(Path::new(&args[1]))
    };

    println!("Loaded {} scripts", catalog.len());

    let registry = ProcessorRegistry::default();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for id in catalog.ids() {
        if let Ok(script) = catalog.get(id) {
            let (e, w) = lint_script(script, &registry);
            errors.extend(e);
            warnings.extend(w);
        }
    }

    println!("\n=== Script Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_catalog(path: &Path) -> ScriptCatalog {
    if path.is_file() {
        match Script::load_from_ron(path) {
            Ok(script) => {
                let mut catalog = ScriptCatalog::new();
                catalog.insert(script);
                catalog
            }
            Err(e) => {
                eprintln!("ERROR: Failed to load script file: {}", e);
                process::exit(1);
            }
        }
    } else if path.is_dir() {
        match ScriptCatalog::load_dir(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                eprintln!("ERROR: Failed to load scripts from '{}': {}", path.display(), e);
                process::exit(1);
            }
        }
    } else {
        eprintln!("ERROR: Path '{}' does not exist", path.display());
        process::exit(1);
    }
}

fn lint_script(script: &Script, registry: &ProcessorRegistry) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let id = &script.id;

    // Night orders must only name roles on the script, once each
    for role in script.unknown_night_roles() {
        errors.push(format!("[{}] night order names unknown role '{}'", id, role));
    }
    for (label, order) in [("first night", &script.first_night), ("other nights", &script.other_nights)] {
        let mut seen = FxHashSet::default();
        for role in order {
            if !seen.insert(role.as_str()) {
                errors.push(format!("[{}] {} lists '{}' twice", id, label, role));
            }
        }
    }

    if script.roles_of_team(Team::Demon).next().is_none() {
        errors.push(format!("[{}] script has no demon", id));
    }

    // Successors only make sense on the evil team
    for role in script.roles_with_trait(RoleTrait::Successor) {
        if !role.team.is_evil() {
            warnings.push(format!("[{}] successor role '{}' is not evil", id, role.id));
        }
    }

    if !registry.supports(id) {
        warnings.push(format!(
            "[{}] no ability processors; ability calls will fail as unsupported",
            id
        ));
        return (errors, warnings);
    }

    for role in &script.roles {
        if !registry.has_processor(id, &role.id) {
            warnings.push(format!("[{}] role '{}' has no processor", id, role.id));
        }
    }

    (errors, warnings)
}
