/// Errors raised while turning EXPLAIN output into a plan tree.
#[non_exhaustive]
#[derive(Debug, miette::Diagnostic, thiserror::Error)]
#[diagnostic()]
pub enum Error {
    /// Input is not valid JSON, or a field has the wrong type
    #[error("malformed EXPLAIN JSON: {0}")]
    #[diagnostic(help("run EXPLAIN with (FORMAT JSON) and pass its output unchanged"))]
    MalformedJson(#[from] serde_json::Error),
    /// A JSON array without any statement in it
    #[error("EXPLAIN output contains no statements")]
    EmptyDocument,
    /// A statement entry without a "Plan" object
    #[error("statement {0} has no \"Plan\" object")]
    MissingPlan(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
