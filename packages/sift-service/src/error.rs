pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Embedding provider returned {actual} vectors for {expected} texts.")]
	EmbeddingMismatch { expected: usize, actual: usize },
	#[error("Rewrite of chunk {chunk_index} is empty.")]
	InvalidRewrite { chunk_index: usize },
	#[error("Tokenizer error: {message}")]
	Tokenizer { message: String },
	#[error("Scoring task failed: {message}")]
	Scoring { message: String },
}
impl From<sift_providers::Error> for Error {
	fn from(err: sift_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<sift_domain::AssignmentError> for Error {
	fn from(err: sift_domain::AssignmentError) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}

impl From<sift_chunking::UnknownStrategy> for Error {
	fn from(err: sift_chunking::UnknownStrategy) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
