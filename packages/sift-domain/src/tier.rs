use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
	Poor,
	Weak,
	Moderate,
	Good,
	Excellent,
}
impl ScoreTier {
	pub fn from_score(score: f32) -> Self {
		match score {
			s if s >= 90.0 => Self::Excellent,
			s if s >= 75.0 => Self::Good,
			s if s >= 60.0 => Self::Moderate,
			s if s >= 40.0 => Self::Weak,
			_ => Self::Poor,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Excellent => "excellent",
			Self::Good => "good",
			Self::Moderate => "moderate",
			Self::Weak => "weak",
			Self::Poor => "poor",
		}
	}
}
