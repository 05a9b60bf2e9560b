use anyhow::{Context, Result, bail};
use clap_anno_metadata::{CommandSpec, Description, GroupSpec, ParamSpec};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DESCRIPTION_NAME: &str = "anno.json";

#[derive(Debug, Clone)]
pub struct LoadedDescription {
    pub path: PathBuf,
    pub description: Description,
}

/// Load a description file. Relative paths resolve against the current
/// directory; with no path, `anno.json` there is used.
pub fn load_description(path: Option<&Path>) -> Result<LoadedDescription> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    let path = match path {
        Some(p) => resolve_against(&cwd, p),
        None => cwd.join(DEFAULT_DESCRIPTION_NAME),
    };

    if !path.exists() {
        bail!("description not found: {}", path.display());
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read description: {}", path.display()))?;
    let description = Description::from_json(&contents)
        .with_context(|| format!("failed to parse description JSON: {}", path.display()))?;

    Ok(LoadedDescription { path, description })
}

fn starter(name: &str) -> GroupSpec {
    let mut verbose = ParamSpec::new("verbose");
    verbose.annotation = Some("flag".to_string());
    let mut count = ParamSpec::new("count");
    count.default = Some(clap_anno_metadata::DefaultValue::Int(1));

    GroupSpec {
        name: name.to_string(),
        help: "Example command tree".to_string(),
        init: vec![verbose],
        commands: vec![CommandSpec {
            name: "greet".to_string(),
            help: "Greet someone".to_string(),
            params: vec![ParamSpec::new("name"), count],
            aliases: vec!["hello".to_string()],
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Write a starter `anno.json` into `project_dir`. An existing file is kept
/// unless `overwrite` is set.
pub fn write_default_description(project_dir: &Path, overwrite: bool) -> Result<PathBuf> {
    let dest = project_dir.join(DEFAULT_DESCRIPTION_NAME);
    if dest.exists() && !overwrite {
        return Ok(dest);
    }

    let name = guess_project_name(project_dir).unwrap_or_else(|| "App".to_string());
    let bytes =
        serde_json::to_vec_pretty(&starter(&name)).context("failed to serialize description")?;
    let mut out = String::from_utf8(bytes).context("description is not valid UTF-8")?;
    out.push('\n');

    let tmp = dest.with_extension("tmp");
    fs::write(&tmp, out.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    if overwrite && dest.exists() {
        fs::remove_file(&dest).with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    fs::rename(&tmp, &dest)
        .with_context(|| format!("failed to move {} into place", dest.display()))?;
    Ok(dest)
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Class-style name for the starter tree, from the directory name
/// (`my_tool` → `MyTool`).
fn guess_project_name(project_dir: &Path) -> Option<String> {
    let file_name = project_dir.file_name().and_then(|s| s.to_str());
    let direct = file_name.filter(|s| !s.is_empty() && *s != "." && *s != "..");
    let raw = match direct {
        Some(name) => name.to_string(),
        None => {
            let cwd = std::env::current_dir().ok()?;
            cwd.file_name()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty() && *s != "." && *s != "..")?
                .to_string()
        }
    };

    let name: String = raw
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    (!name.is_empty()).then_some(name)
}
