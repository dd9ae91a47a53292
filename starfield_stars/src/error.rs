use starfield_ids::NodeID;
use starfield_scene::ModelError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StarError {
    #[error("template prototype {0} is not in the scene")]
    TemplateMissing(NodeID),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StarsError {
    #[error("star template unavailable: {0}")]
    TemplateUnavailable(String),
    #[error("stars manager is detached")]
    Detached,
    #[error(transparent)]
    Star(#[from] StarError),
}
