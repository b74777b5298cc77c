//! Context a query compiles and executes against.

use crate::execution::ExecutionPipeline;
use crate::model::{DynamicModel, GraphModel};
use crate::options::QueryOptions;
use std::fmt;
use std::sync::Arc;

/// Graph model, options and execution pipeline shared by a family of queries
#[derive(Clone)]
pub struct QueryEnvironment {
    model: Arc<dyn GraphModel>,
    options: QueryOptions,
    pipeline: ExecutionPipeline,
}

impl Default for QueryEnvironment {
    /// Identity model, default options and an unconfigured pipeline
    fn default() -> Self {
        Self {
            model: Arc::new(DynamicModel),
            options: QueryOptions::default(),
            pipeline: ExecutionPipeline::invalid(),
        }
    }
}

impl QueryEnvironment {
    pub fn new(model: Arc<dyn GraphModel>, options: QueryOptions, pipeline: ExecutionPipeline) -> Self {
        Self {
            model,
            options,
            pipeline,
        }
    }

    pub fn model(&self) -> &Arc<dyn GraphModel> {
        &self.model
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn pipeline(&self) -> &ExecutionPipeline {
        &self.pipeline
    }

    pub fn with_model(self, model: Arc<dyn GraphModel>) -> Self {
        Self { model, ..self }
    }

    pub fn with_options(self, options: QueryOptions) -> Self {
        Self { options, ..self }
    }

    pub fn with_pipeline(self, pipeline: ExecutionPipeline) -> Self {
        Self { pipeline, ..self }
    }
}

impl fmt::Debug for QueryEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEnvironment")
            .field("model", &self.model)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
