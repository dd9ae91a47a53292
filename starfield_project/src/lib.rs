use std::{
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
};
use toml::Value;

pub const CONFIG_FILE: &str = "starfield.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct StarsConfig {
    pub size: f32,
    pub spin_step: f32,
    pub highlight_intensity: f32,
    pub ambient_intensity: f32,
    pub highlight_ids: Vec<String>,
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            size: 3.0,
            spin_step: 0.008,
            highlight_intensity: 1.2,
            ambient_intensity: 0.3,
            highlight_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub frame_rate: u32,
    /// Frames to run before detaching. 0 runs until interrupted.
    pub frames: u64,
    /// Re-read the feed every this many frames. 0 reads it once.
    pub reload_every: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            frames: 600,
            reload_every: 120,
        }
    }
}

impl RuntimeConfig {
    #[inline]
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.frame_rate as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub name: String,
    /// Built-in model name or a path to a `.glb`.
    pub template: String,
    pub feed: String,
    pub stars: StarsConfig,
    pub runtime: RuntimeConfig,
}

impl ProjectConfig {
    pub fn default_for_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: "__star__".to_string(),
            feed: "local://stars.json".to_string(),
            stars: StarsConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }

    /// Template path with `local://` resolved; built-in names pass through untouched.
    pub fn template_path(&self, local_root: &Path) -> PathBuf {
        resolve_local_path(&self.template, local_root)
    }

    pub fn feed_path(&self, local_root: &Path) -> PathBuf {
        resolve_local_path(&self.feed, local_root)
    }
}

#[derive(Debug)]
pub enum ProjectError {
    Io(std::io::Error),
    ParseToml(toml::de::Error),
    MissingField(&'static str),
    InvalidField(&'static str, String),
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::ParseToml(err) => write!(f, "{err}"),
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidField(field, reason) => write!(f, "invalid field `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ProjectError {}

impl From<std::io::Error> for ProjectError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ProjectError {
    fn from(value: toml::de::Error) -> Self {
        Self::ParseToml(value)
    }
}

pub fn resolve_local_path(input: &str, local_root: &Path) -> PathBuf {
    if let Some(stripped) = input.strip_prefix("local://") {
        let rel = stripped.trim_start_matches('/');
        if rel.is_empty() {
            return local_root.to_path_buf();
        }
        return local_root.join(rel);
    }
    PathBuf::from(input)
}

/// Loads `path`, or `starfield.toml` inside it when `path` is a directory.
/// Returns the config and the directory `local://` paths resolve against.
pub fn load_project_toml(path: &Path) -> Result<(ProjectConfig, PathBuf), ProjectError> {
    let file = if path.is_dir() {
        path.join(CONFIG_FILE)
    } else {
        path.to_path_buf()
    };
    let contents = fs::read_to_string(&file)?;
    let root = file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((parse_project_toml(&contents)?, root))
}

pub fn default_project_toml(name: &str) -> String {
    format!(
        r#"[project]
name = "{name}"
template = "__star__"
feed = "local://stars.json"

[stars]
size = 3.0
spin_step = 0.008

[runtime]
frame_rate = 60
frames = 600
reload_every = 120
"#
    )
}

pub fn parse_project_toml(contents: &str) -> Result<ProjectConfig, ProjectError> {
    let value: Value = contents.parse::<Value>()?;
    let project_table = value
        .get("project")
        .and_then(Value::as_table)
        .ok_or(ProjectError::MissingField("project"))?;

    let name = required_str(project_table, "name", "project.name")?;
    let template = required_str(project_table, "template", "project.template")?;
    let feed = required_str(project_table, "feed", "project.feed")?;

    let stars = match value.get("stars").and_then(Value::as_table) {
        Some(table) => parse_stars_table(table)?,
        None => StarsConfig::default(),
    };
    let runtime = match value.get("runtime").and_then(Value::as_table) {
        Some(table) => parse_runtime_table(table)?,
        None => RuntimeConfig::default(),
    };

    Ok(ProjectConfig {
        name,
        template,
        feed,
        stars,
        runtime,
    })
}

fn required_str(
    table: &toml::Table,
    key: &str,
    field: &'static str,
) -> Result<String, ProjectError> {
    let raw = table
        .get(key)
        .and_then(Value::as_str)
        .ok_or(ProjectError::MissingField(field))?
        .trim();
    if raw.is_empty() {
        return Err(ProjectError::InvalidField(
            field,
            "must not be empty".to_string(),
        ));
    }
    Ok(raw.to_string())
}

fn parse_stars_table(table: &toml::Table) -> Result<StarsConfig, ProjectError> {
    let defaults = StarsConfig::default();
    let highlight_ids = match table.get("highlight_ids") {
        None => Vec::new(),
        Some(value) => value
            .as_array()
            .ok_or_else(|| {
                ProjectError::InvalidField(
                    "stars.highlight_ids",
                    "expected an array of strings".to_string(),
                )
            })?
            .iter()
            .map(|id| {
                id.as_str().map(str::to_string).ok_or_else(|| {
                    ProjectError::InvalidField(
                        "stars.highlight_ids",
                        "expected an array of strings".to_string(),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(StarsConfig {
        size: positive_float(table, "size", "stars.size", defaults.size)?,
        spin_step: float_or(table, "spin_step", "stars.spin_step", defaults.spin_step)?,
        highlight_intensity: non_negative_float(
            table,
            "highlight_intensity",
            "stars.highlight_intensity",
            defaults.highlight_intensity,
        )?,
        ambient_intensity: non_negative_float(
            table,
            "ambient_intensity",
            "stars.ambient_intensity",
            defaults.ambient_intensity,
        )?,
        highlight_ids,
    })
}

fn parse_runtime_table(table: &toml::Table) -> Result<RuntimeConfig, ProjectError> {
    let defaults = RuntimeConfig::default();
    let frame_rate = match table.get("frame_rate") {
        None => defaults.frame_rate,
        Some(value) => value
            .as_integer()
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                ProjectError::InvalidField(
                    "runtime.frame_rate",
                    "must be a positive integer".to_string(),
                )
            })?,
    };
    Ok(RuntimeConfig {
        frame_rate,
        frames: count_or(table, "frames", "runtime.frames", defaults.frames)?,
        reload_every: count_or(
            table,
            "reload_every",
            "runtime.reload_every",
            defaults.reload_every,
        )?,
    })
}

// TOML integers are accepted wherever a float is expected.
fn float_or(
    table: &toml::Table,
    key: &str,
    field: &'static str,
    default: f32,
) -> Result<f32, ProjectError> {
    match table.get(key) {
        None => Ok(default),
        Some(Value::Float(v)) => Ok(*v as f32),
        Some(Value::Integer(v)) => Ok(*v as f32),
        Some(_) => Err(ProjectError::InvalidField(
            field,
            "must be a number".to_string(),
        )),
    }
}

fn positive_float(
    table: &toml::Table,
    key: &str,
    field: &'static str,
    default: f32,
) -> Result<f32, ProjectError> {
    let value = float_or(table, key, field, default)?;
    if value > 0.0 && value.is_finite() {
        return Ok(value);
    }
    Err(ProjectError::InvalidField(
        field,
        "must be greater than 0".to_string(),
    ))
}

fn non_negative_float(
    table: &toml::Table,
    key: &str,
    field: &'static str,
    default: f32,
) -> Result<f32, ProjectError> {
    let value = float_or(table, key, field, default)?;
    if value >= 0.0 && value.is_finite() {
        return Ok(value);
    }
    Err(ProjectError::InvalidField(
        field,
        "must not be negative".to_string(),
    ))
}

fn count_or(
    table: &toml::Table,
    key: &str,
    field: &'static str,
    default: u64,
) -> Result<u64, ProjectError> {
    match table.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_integer()
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| {
                ProjectError::InvalidField(field, "must be a non-negative integer".to_string())
            }),
    }
}
