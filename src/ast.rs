/// One command of a pipeline, after substitution and argument splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    pub argv: Vec<String>,
}

impl PipelineStage {
    /// Command name, or `""` for an empty stage.
    pub fn name(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    pub stages: Vec<PipelineStage>,
}

impl Pipeline {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }
}
