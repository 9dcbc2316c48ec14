use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("invalid parameter: {0}")]
	InvalidParam(String),

	#[error("unknown particle handle {0}")]
	UnknownParticle(usize),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_carries_context() {
		let e = Error::InvalidParam("bounce keep can not be less than zero".into());
		assert!(format!("{}", e).contains("bounce keep"));
	}
}
