use crate::error::TemplateError;
use futures::FutureExt;
use futures::future::BoxFuture;
use starfield_scene::ModelData;
use starfield_scene::presets;
use std::path::PathBuf;

/// Produces the star template model. A manager calls `load` exactly once.
pub trait TemplateSource: Send + Sync + 'static {
    fn load(&self) -> BoxFuture<'static, Result<ModelData, TemplateError>>;
}

/// Reads a binary glTF from disk. Built-in names such as `__star__` skip the filesystem.
#[derive(Debug, Clone)]
pub struct FileTemplateSource {
    path: PathBuf,
}

impl FileTemplateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TemplateSource for FileTemplateSource {
    fn load(&self) -> BoxFuture<'static, Result<ModelData, TemplateError>> {
        let path = self.path.clone();
        let builtin = path
            .to_str()
            .filter(|p| presets::is_builtin(p))
            .map(str::to_string);
        async move {
            if let Some(name) = builtin {
                log::debug!("using built-in template {name}");
                return Ok(ModelData::builtin(&name)?);
            }
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| TemplateError::Io {
                    path: path.clone(),
                    source,
                })?;
            let model = ModelData::from_glb(&bytes)?;
            log::debug!(
                "loaded template {} ({} meshes)",
                path.display(),
                model.mesh_count()
            );
            Ok(model)
        }
        .boxed()
    }
}

/// Hands out an already-built model.
#[derive(Debug, Clone)]
pub struct StaticTemplateSource {
    model: ModelData,
}

impl StaticTemplateSource {
    pub fn new(model: ModelData) -> Self {
        Self { model }
    }
}

impl TemplateSource for StaticTemplateSource {
    fn load(&self) -> BoxFuture<'static, Result<ModelData, TemplateError>> {
        futures::future::ready(Ok(self.model.clone())).boxed()
    }
}
