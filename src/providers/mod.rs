mod gitlab;

pub use gitlab::{GitLabProvider, PipelineListing, VariableCache};
