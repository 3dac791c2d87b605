//! Error types for rdocs core operations.

use miette::Diagnostic;

/// Errors raised while loading the term dictionary.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum DictionaryError {
    /// The dictionary JSON could not be parsed.
    #[error("invalid dictionary data: {0}")]
    #[diagnostic(code(rdocs::dictionary::parse))]
    Parse(#[from] serde_json::Error),

    /// An entry has an empty token.
    #[error("dictionary entry {index} has an empty token")]
    #[diagnostic(code(rdocs::dictionary::empty_token))]
    EmptyToken { index: usize },

    /// Two entries share the same token.
    #[error("duplicate dictionary token `{token}`")]
    #[diagnostic(
        code(rdocs::dictionary::duplicate),
        help("tokens are matched exactly; each one may appear only once")
    )]
    DuplicateToken { token: String },
}

/// Errors raised while compiling the token matcher.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum MatcherError {
    #[error("failed to compile token matcher: {0}")]
    #[diagnostic(code(rdocs::matcher::compile))]
    Compile(String),
}

/// Errors raised while loading or validating tooltip configuration.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("invalid tooltip config: {0}")]
    #[diagnostic(code(rdocs::config::parse))]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    #[diagnostic(code(rdocs::config::invalid))]
    Invalid { field: &'static str, reason: String },
}

/// Main error type for rdocs core.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum CoreError {
    #[error(transparent)]
    #[diagnostic_source]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    #[diagnostic_source]
    Matcher(#[from] MatcherError),

    #[error(transparent)]
    #[diagnostic_source]
    Config(#[from] ConfigError),
}

/// Failure reported by a document host while rewriting content.
///
/// Hosts wrap whatever their native error is (a `JsValue` in the browser)
/// into a message. The annotator logs these and moves on.
#[derive(Debug, Clone)]
pub struct HostError(pub String);

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for HostError {}

impl From<&str> for HostError {
    fn from(s: &str) -> Self {
        HostError(s.to_string())
    }
}

impl From<String> for HostError {
    fn from(s: String) -> Self {
        HostError(s)
    }
}
